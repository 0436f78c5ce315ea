// src/serve/mod.rs

//! Development HTTP server.
//!
//! Serves built assets from an ordered list of roots (staging first, then
//! the source tree, then the project root for vendor files). HTML responses
//! get the live reload client script injected before `</body>`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::errors::Result;

/// Client script template; `{port}` is replaced with the bound WebSocket
/// port at injection time.
const RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var ws = new WebSocket("ws://127.0.0.1:{port}");
  ws.onmessage = function (ev) {
    var msg = JSON.parse(ev.data);
    switch (msg.type) {
      case "reload":
        location.reload();
        break;
      case "css":
        document.querySelectorAll("link[rel=stylesheet]").forEach(function (link) {
          var href = link.href.split("?")[0];
          link.href = href + "?t=" + Date.now();
        });
        break;
    }
  };
})();
</script>"#;

pub struct DevServer {
    port: u16,
}

impl DevServer {
    /// Bind and start serving on a background thread.
    ///
    /// `roots` are tried in order for every request; the first hit wins.
    pub fn start(port: u16, roots: Vec<PathBuf>, ws_port: Option<u16>) -> Result<Self> {
        let server = Server::http(("127.0.0.1", port))
            .map_err(|e| anyhow!("binding dev server on port {port}: {e}"))?;
        let bound = server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .unwrap_or(port);

        let server = Arc::new(server);
        let roots = Arc::new(roots);

        let loop_server = Arc::clone(&server);
        let loop_roots = Arc::clone(&roots);
        std::thread::spawn(move || {
            for request in loop_server.incoming_requests() {
                if let Err(e) = handle_request(request, &loop_roots, ws_port) {
                    warn!(error = %e, "dev server request failed");
                }
            }
        });

        info!(port = bound, "dev server listening");
        Ok(Self { port: bound })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn handle_request(request: Request, roots: &[PathBuf], ws_port: Option<u16>) -> Result<()> {
    let url = request.url();
    let rel = url.split('?').next().unwrap_or(url).trim_start_matches('/');
    debug!(url = %url, "dev server request");

    let Some(file) = resolve(roots, rel) else {
        let response = Response::from_string("404 Not Found")
            .with_status_code(404)
            .with_header(header("Content-Type", "text/plain; charset=utf-8"));
        request.respond(response)?;
        return Ok(());
    };

    let content_type = mime_for(&file);
    let mut body =
        fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    if content_type.starts_with("text/html") {
        if let Some(port) = ws_port {
            body = inject_reload_script(&body, port);
        }
    }

    let response = Response::from_data(body).with_header(header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

/// Map a request path to a file under one of the roots. Directory requests
/// (including the site root) fall back to their `index.html`.
fn resolve(roots: &[PathBuf], rel: &str) -> Option<PathBuf> {
    // Reject traversal outside the roots.
    if rel.split('/').any(|seg| seg == "..") {
        return None;
    }

    for root in roots {
        let candidate = if rel.is_empty() {
            root.join("index.html")
        } else {
            root.join(rel)
        };
        if candidate.is_file() {
            return Some(candidate);
        }
        if candidate.is_dir() {
            let index = candidate.join("index.html");
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

/// Insert the reload client before `</body>`, or append when the page has
/// no body close tag.
fn inject_reload_script(content: &[u8], ws_port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let script = RELOAD_SCRIPT.replace("{port}", &ws_port.to_string());
    let script = script.as_bytes();

    let mut out = Vec::with_capacity(content.len() + script.len());
    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            out.extend_from_slice(&content[..pos]);
            out.extend_from_slice(script);
            out.extend_from_slice(&content[pos..]);
        }
        None => {
            out.extend_from_slice(content);
            out.extend_from_slice(script);
        }
    }
    out
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("map") => "application/json",
        _ => "application/octet-stream",
    }
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

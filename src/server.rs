//! Read-only dashboard server
//!
//! Serves the dashboard page for each section from live API data. Every
//! request navigates the shared [`Dashboard`] and renders the page, so
//! requests are handled one at a time. Pages are rendered without the
//! creation forms and row actions since nothing here accepts writes.

use crate::controller::Dashboard;
use crate::filter::LogFilter;
use crate::interaction::Scripted;
use crate::page::{self, PageMode};
use crate::state::Section;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

type SharedDashboard = Arc<Mutex<Dashboard<Scripted>>>;

/// Helper to create a plain-text response - infallible with valid StatusCode
fn response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(body.into()))
        .expect("valid response with StatusCode enum")
}

fn html_response(body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .expect("valid response with static header")
}

pub struct DashboardServer {
    listener: TcpListener,
    dashboard: SharedDashboard,
    shutdown_rx: watch::Receiver<bool>,
}

impl DashboardServer {
    /// Bind the listener. The dashboard should use a [`Scripted`]
    /// interaction with nothing queued, which declines every confirmation.
    pub async fn bind(
        addr: SocketAddr,
        dashboard: Dashboard<Scripted>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            dashboard: Arc::new(Mutex::new(dashboard)),
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!(addr = %addr, "Dashboard server listening");

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let dashboard = Arc::clone(&self.dashboard);
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, dashboard).await {
                                    debug!(addr = %addr, error = %e, "Dashboard connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept dashboard connection");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Dashboard server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, dashboard: SharedDashboard) -> anyhow::Result<()> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let dashboard = Arc::clone(&dashboard);
        async move { handle_request(req, dashboard).await }
    });

    AutoBuilder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
        .map_err(|e| anyhow::anyhow!("Dashboard connection error: {}", e))?;

    Ok(())
}

/// Decode `environment` and `status` from a query string
fn parse_filter(query: Option<&str>) -> LogFilter {
    let mut environment = String::new();
    let mut status = String::new();

    for pair in query.unwrap_or("").split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(&value.replace('+', " "))
            .map(|v| v.into_owned())
            .unwrap_or_default();
        match key {
            "environment" => environment = value,
            "status" => status = value,
            _ => {}
        }
    }

    LogFilter::from_controls(&environment, &status)
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    dashboard: SharedDashboard,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    debug!(%method, %path, "Dashboard request");

    let section = match (&method, path.as_str()) {
        (&Method::GET, "/health") => return Ok(response(StatusCode::OK, "ok")),
        (&Method::GET, "/") | (&Method::GET, "/users") => Section::Users,
        (&Method::GET, "/releases") => Section::Releases,
        (&Method::GET, "/logs") => Section::Logs,
        (&Method::GET, _) => return Ok(response(StatusCode::NOT_FOUND, "not found")),
        _ => return Ok(response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")),
    };

    let mut dashboard = dashboard.lock().await;
    match section {
        // The users section shows the data loaded at start; refresh it on each view
        Section::Users => {
            dashboard.navigate(Section::Users).await;
            dashboard.list_users().await;
        }
        Section::Releases => {
            // Owner choices come from the user list
            dashboard.list_users().await;
            dashboard.navigate(Section::Releases).await;
        }
        Section::Logs => {
            if dashboard.navigate(Section::Logs).await.is_done() {
                let filter = parse_filter(query.as_deref());
                if !filter.is_empty() {
                    dashboard.apply_filters(filter);
                }
            }
        }
    }

    let notices = dashboard.interaction_mut().take_notices();
    let html = page::render(
        dashboard.state(),
        dashboard.catalog(),
        &notices,
        PageMode::ReadOnly,
    );
    Ok(html_response(html))
}

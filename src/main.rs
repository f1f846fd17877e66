//! Area Window
//!
//! Runs one layout pass over a small set of windows and prints what the
//! clients were told. Useful to check a config file against real numbers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use area_window::config::Config;
use area_window::shared::Rect;
use area_window::wm::client::{ClientQueue, ResizeReport, WindowClient};
use area_window::wm::container::{AppWindowToken, Task, TaskId, TaskMode, TokenId, WindowToken};
use area_window::wm::draw_state::DrawState;
use area_window::wm::errors::ClientError;
use area_window::wm::frame::LayoutFrames;
use area_window::wm::window::{WindowId, WindowParams};
use area_window::wm::window_flags::{LayoutDimension, WindowAttrs, WindowType};
use area_window::wm::WindowManager;

/// Client that only logs what it receives
struct LoggingClient {
    name: String,
}

impl WindowClient for LoggingClient {
    fn resized(&self, report: &ResizeReport) -> Result<(), ClientError> {
        info!(
            "[{}] resized: frame={} content={} visible={} stable={} draw={}",
            self.name,
            report.frame,
            report.content_insets,
            report.visible_insets,
            report.stable_insets,
            report.report_draw
        );
        Ok(())
    }

    fn focus_changed(&self, focused: bool, in_touch_mode: bool) -> Result<(), ClientError> {
        info!("[{}] focus: {} (touch mode: {})", self.name, focused, in_touch_mode);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        true
    }
}

struct Args {
    config: Option<PathBuf>,
    dump: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        config: None,
        dump: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--dump" | "-d" => parsed.dump = true,
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

fn client(name: &str) -> Arc<dyn WindowClient> {
    Arc::new(LoggingClient { name: name.into() })
}

/// Lay out an app window with a panel and a toast on a screen with a
/// status bar and a navigation bar.
fn run_layout_pass(wm: &mut WindowManager, config: &Config) -> Result<Vec<WindowId>> {
    let info = config.display.info();
    let screen = info.logical_rect();
    let status_bar = info.dip_to_px(24);
    let nav_bar = info.dip_to_px(48);

    wm.add_task(TaskId(1), Task::new(screen, TaskMode::Fullscreen));
    wm.add_token(TokenId(1), WindowToken::app(AppWindowToken::for_task(TaskId(1))));
    wm.add_token(TokenId(2), WindowToken::system());

    let app = wm.add_window(
        WindowParams::new(WindowAttrs::new(WindowType::Application).with_title("Demo"), TokenId(1)),
        client("app"),
    )?;
    let panel = wm.add_window(
        WindowParams::new(
            WindowAttrs::new(WindowType::ApplicationPanel)
                .with_title("Panel")
                .with_size(LayoutDimension::MatchParent, LayoutDimension::Exact(info.dip_to_px(200))),
            TokenId(1),
        )
        .with_parent(app),
        client("panel"),
    )?;
    let toast = wm.add_window(
        WindowParams::new(
            WindowAttrs::new(WindowType::Toast)
                .with_title("Toast")
                .with_size(LayoutDimension::Exact(info.dip_to_px(200)), LayoutDimension::Exact(info.dip_to_px(48))),
            TokenId(2),
        ),
        client("toast"),
    )?;

    let mut frames = LayoutFrames::uniform(screen);
    frames.content = Rect::new(0, status_bar, screen.right, screen.bottom - nav_bar);
    frames.visible = frames.content;
    frames.stable = frames.content;
    frames.decor = frames.content;

    let windows = vec![app, panel, toast];
    for &id in &windows {
        let window = wm.window_mut(id)?;
        window.relayout_called = true;
        let requested = |dim: LayoutDimension, full: i32| match dim {
            LayoutDimension::Exact(px) => px,
            _ => full,
        };
        let width = requested(window.attrs.width, screen.width());
        let height = requested(window.attrs.height, screen.height());
        window.set_requested_size(width, height);

        wm.prelayout(id)?;
        wm.compute_frame(id, &frames)?;

        let window = wm.window_mut(id)?;
        window.create_surface()?;
        window.set_insets_changed();
        window.snapshot_last_insets();
        window.snapshot_last_frame();
        wm.report_resized(id)?;
        wm.set_draw_state(id, DrawState::CommitDrawPending)?;
        wm.set_draw_state(id, DrawState::ReadyToShow)?;
    }
    wm.report_focus_changed(app, true, false)?;

    Ok(windows)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Area Window");

    let shared = WindowManager::new(config.layout.clone(), config.display.info()).into_shared();
    let worker = ClientQueue::start(&shared).context("Client delivery task already running")?;

    let windows = {
        let mut wm = shared.lock();
        match run_layout_pass(&mut wm, &config) {
            Ok(windows) => windows,
            Err(e) => {
                error!("Layout pass failed: {}", e);
                return Err(e);
            }
        }
    };

    if args.dump {
        let wm = shared.lock();
        for id in windows {
            let dump = wm.dump_window(id)?;
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
    }

    // Dropping the manager closes the queue once it is drained
    drop(shared);
    worker.await.context("Client delivery task panicked")?;

    info!("Done");
    Ok(())
}

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use kcb_core::{
    config::Config, gallery::GalleryStore, interpreter::CommandInterpreter,
    session::SessionRegistry,
};
use kcb_web::WebState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kcb_core::logging::init("kcb")?;

    let cfg = Arc::new(Config::load()?);
    info!(
        owner = cfg.owner_id.0,
        public_dir = %cfg.public_dir.display(),
        static_dir = %cfg.static_dir.display(),
        "Configuration loaded"
    );

    let store = GalleryStore::open(&cfg.public_dir)?;
    std::fs::create_dir_all(&cfg.static_dir)?;
    info!("Directories initialized");

    let interpreter = Arc::new(CommandInterpreter::new(cfg.owner_id, store));
    let sessions = Arc::new(Mutex::new(SessionRegistry::new(cfg.session_idle_timeout)));

    // Drop upload sessions nobody has touched for a while.
    let sweep = sessions.clone();
    let sweep_every = cfg.session_sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let evicted = sweep.lock().await.evict_idle();
            if evicted > 0 {
                debug!(evicted, "Evicted idle upload sessions");
            }
        }
    });

    let web_state = WebState::new(cfg.public_dir.clone(), cfg.static_dir.clone());

    tokio::select! {
        result = kcb_web::serve(web_state, cfg.http_addr) => {
            if let Err(e) = result {
                error!(error = %e, "Web server failed");
                return Err(e);
            }
        }
        result = kcb_telegram::router::run_polling(cfg.clone(), interpreter, sessions) => {
            if let Err(e) = result {
                error!(error = %e, "Telegram bot failed");
                return Err(e);
            }
            info!("Telegram dispatcher stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

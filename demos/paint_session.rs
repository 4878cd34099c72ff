use grimpan::{
    host::StaticHost,
    persist::{JsonSnapshotStore, SnapshotStore},
    provider::BackendProvider,
    render::{Color, Point},
    DrawingMode, EngineConfig, EngineError, SessionOptions, SessionRegistry,
};

use grimpan::bus::InMemoryBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    env_logger::init();

    // Engine configuration. Every field has a default, so we only set what we care about.
    let config = EngineConfig::from_json(
        r#"{
            "default_backend": "chrome",
            "history": { "max_entries": 20 },
            "autosave": { "enabled": true }
        }"#,
    )?;

    // Every save is written to a JSON file in the temp directory by a background task.
    let path = std::env::temp_dir().join("grimpan-demo.json");
    let store = Arc::new(JsonSnapshotStore::open(&path).expect("cannot open snapshot store"));

    // The registry is created once and owns the bus that all sessions share.
    let registry = SessionRegistry::new(
        config,
        Arc::new(StaticHost::modern()),
        BackendProvider::new(),
        Arc::new(InMemoryBus::new()),
    )
    .with_autosave(store.clone());

    let handle = registry.get_default()?;
    {
        let mut session = handle.lock().map_err(|_| EngineError::Poisoned)?;
        session.initialize(&SessionOptions::default())?;

        // A red stroke, then a blue circle
        session.set_color(Color::from_u8(220, 30, 30, 255));
        session.gesture(&[
            Point::new(10.0, 10.0),
            Point::new(120.0, 40.0),
            Point::new(200.0, 90.0),
        ])?;
        session.save()?;

        session.set_mode(DrawingMode::Circle)?;
        session.set_color(Color::from_u8(30, 30, 220, 255));
        session.gesture(&[Point::new(300.0, 300.0), Point::new(340.0, 300.0)])?;
        session.save()?;

        // Pick the stroke color back up from the canvas
        session.set_mode(DrawingMode::Pipette)?;
        session.gesture(&[Point::new(120.0, 40.0)])?;
        println!("pipette picked {:?}", session.color());

        let undone = session.undo()?;
        println!(
            "undo: back to {} items, history cursor at {:?}",
            undone.map(|s| s.items().len()).unwrap_or(0),
            session.history().cursor()
        );

        let thumb = session.thumbnail()?;
        println!("thumbnail: {}x{}", thumb.width, thumb.height);
    }

    // Give the autosave task a moment, then stop it.
    sleep(Duration::from_millis(100)).await;
    for join in registry.shutdown() {
        let _ = join.await;
    }

    match store.get("modern") {
        Ok(Some(snapshot)) => println!(
            "persisted {} items to {}",
            snapshot.items().len(),
            path.display()
        ),
        Ok(None) => println!("nothing persisted yet"),
        Err(e) => println!("cannot read store: {}", e),
    }

    Ok(())
}

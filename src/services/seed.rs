use tracing::info;

use crate::{error::AppError, models::hike::NewHike, services::store::HikeStore};

/// Insert the sample hikes once, on first startup against an empty store.
pub async fn seed_hikes(store: &HikeStore) -> Result<(), AppError> {
    if store.count_hikes().await? > 0 {
        info!("hikes collection already contains data, skipping seed");
        return Ok(());
    }

    info!("hikes collection is empty, seeding sample data");
    for hike in sample_hikes() {
        store.add_hike(hike).await?;
    }
    Ok(())
}

fn sample_hikes() -> Vec<NewHike> {
    vec![
        NewHike {
            code: "BBY01".into(),
            name: "Burnaby Lake Park Trail".into(),
            city: "Burnaby".into(),
            level: "easy".into(),
            details: Some("A lovely place for a lunch walk.".into()),
            length: 10.0,
            hike_time: 60,
            lat: 49.2467097082573,
            lng: -122.9187029619698,
        },
        NewHike {
            code: "AM01".into(),
            name: "Buntzen Lake Trail".into(),
            city: "Anmore".into(),
            level: "moderate".into(),
            details: Some("Close to town, and relaxing.".into()),
            length: 10.5,
            hike_time: 80,
            lat: 49.3399431028579,
            lng: -122.85908496766939,
        },
        NewHike {
            code: "NV01".into(),
            name: "Mount Seymour Trail".into(),
            city: "North Vancouver".into(),
            level: "hard".into(),
            details: Some("Amazing ski slope views.".into()),
            length: 8.2,
            hike_time: 120,
            lat: 49.38847101455571,
            lng: -122.94092543551031,
        },
    ]
}

use std::sync::Arc;

use log::info;
use metrics_exporter_prometheus::PrometheusHandle;

use fogpass::config::SeedRoute;
use fogpass::db::route_repo::{self, RouteRow};
use fogpass::{
    Config, Database, DatabaseError, FogpassError, IngestPool, JobTracker, LandmarkFileStore,
    Pipeline, PipelineConfig, ScratchSpace, UploadIntake,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tracker: JobTracker,
    pub intake: Arc<UploadIntake>,
    pub pool: Arc<IngestPool>,
    pub metrics: Option<PrometheusHandle>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Opens the database, seeds routes, and starts the ingest pool.
    pub fn from_config(
        config: &Config,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, FogpassError> {
        let db = match config.database_path() {
            Some(path) => Database::open(&path)?,
            None => Database::open_in_memory()?,
        };

        let seeded = seed_routes(&db, &config.seed_routes)?;
        if seeded > 0 {
            info!("Seeded {} routes", seeded);
        }

        let pipeline_config = Arc::new(PipelineConfig::from_config(config));
        let pipeline = Arc::new(Pipeline::from_config(pipeline_config, db.clone()));
        let pool = Arc::new(IngestPool::new(
            pipeline,
            config.max_concurrent_jobs,
            config.queue_capacity(),
        )?);

        let file_store = config.landmarks_path.as_ref().map(LandmarkFileStore::new);
        let intake = Arc::new(UploadIntake::new(
            db.clone(),
            ScratchSpace::new(&config.upload_dir),
            file_store,
            Arc::clone(&pool),
        ));

        Ok(Self {
            tracker: JobTracker::new(db.clone()),
            db,
            intake,
            pool,
            metrics,
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

/// Inserts configured routes that do not exist yet. Returns how many were added.
pub fn seed_routes(db: &Database, routes: &[SeedRoute]) -> Result<usize, DatabaseError> {
    let mut inserted = 0;
    for route in routes {
        let row = RouteRow {
            id: route.id,
            name: route.name.clone(),
            route_code: route.route_code.clone(),
            direction: route.direction.clone(),
        };
        if route_repo::insert(db, &row)? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

use crate::db::merge::{MergePlan, MergeSummary};
use crate::db::models::{
    CameraDetails, CameraSnapshot, DbArea, DbCamera, DbCameraImage, DbTransaction,
    DbWeatherForecast, TransactionCreate,
};
use crate::db::schema::SQLITE_INIT;
use crate::db::sqlite::{self, SqliteSnapshotWriter};
use crate::error::{ReadError, StoreError};
use crate::snapshot::{EpochMillis, SnapshotResult};
use ractor::{Actor, ActorProcessingErr, ActorRef, RactorErr, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::future::Future;
use std::{str::FromStr, time::Duration, time::Instant};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Cameras known as of a timestamp, joined with image and area name.
    ReadCameras(
        EpochMillis,
        RpcReplyPort<Result<Vec<CameraSnapshot>, ReadError>>,
    ),

    /// One camera plus its area forecast, as of a timestamp.
    ReadCameraDetails(
        EpochMillis,
        String,
        RpcReplyPort<Result<CameraDetails, ReadError>>,
    ),

    /// Merge a fetched snapshot in a single transaction.
    Merge(
        EpochMillis,
        Box<SnapshotResult>,
        RpcReplyPort<Result<MergeSummary, StoreError>>,
    ),

    ListAreas(RpcReplyPort<Result<Vec<DbArea>, StoreError>>),
    ListCameras(RpcReplyPort<Result<Vec<DbCamera>, StoreError>>),
    ListCameraImages(RpcReplyPort<Result<Vec<DbCameraImage>, StoreError>>),
    ListWeatherForecasts(RpcReplyPort<Result<Vec<DbWeatherForecast>, StoreError>>),

    /// Record a served request.
    CreateTransaction(TransactionCreate, RpcReplyPort<Result<i64, StoreError>>),

    /// Most recent request records, newest first.
    RecentTransactions(u32, RpcReplyPort<Result<Vec<DbTransaction>, StoreError>>),
}

/// Cloneable handle to the database actor. Every call is bounded by the
/// handle's timeout and reported as [`StoreError::Timeout`] when exceeded.
#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
    timeout: Duration,
}

impl DbActorHandle {
    async fn call<T, F>(&self, name: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, RactorErr<DbActorMessage>>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(res) => {
                res.map_err(|e| StoreError::Actor(format!("DbActor {name} RPC failed: {e}")))
            }
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    pub async fn read_cameras(
        &self,
        timestamp: EpochMillis,
    ) -> Result<Vec<CameraSnapshot>, ReadError> {
        self.call("ReadCameras", async {
            ractor::call!(self.actor, DbActorMessage::ReadCameras, timestamp)
        })
        .await?
    }

    pub async fn read_camera_details(
        &self,
        timestamp: EpochMillis,
        camera_id: &str,
    ) -> Result<CameraDetails, ReadError> {
        let camera_id = camera_id.to_string();
        self.call("ReadCameraDetails", async {
            ractor::call!(
                self.actor,
                DbActorMessage::ReadCameraDetails,
                timestamp,
                camera_id
            )
        })
        .await?
    }

    pub async fn merge(
        &self,
        timestamp: EpochMillis,
        snapshot: SnapshotResult,
    ) -> Result<MergeSummary, StoreError> {
        let snapshot = Box::new(snapshot);
        self.call("Merge", async {
            ractor::call!(self.actor, DbActorMessage::Merge, timestamp, snapshot)
        })
        .await?
    }

    pub async fn list_areas(&self) -> Result<Vec<DbArea>, StoreError> {
        self.call("ListAreas", async {
            ractor::call!(self.actor, DbActorMessage::ListAreas)
        })
        .await?
    }

    pub async fn list_cameras(&self) -> Result<Vec<DbCamera>, StoreError> {
        self.call("ListCameras", async {
            ractor::call!(self.actor, DbActorMessage::ListCameras)
        })
        .await?
    }

    pub async fn list_camera_images(&self) -> Result<Vec<DbCameraImage>, StoreError> {
        self.call("ListCameraImages", async {
            ractor::call!(self.actor, DbActorMessage::ListCameraImages)
        })
        .await?
    }

    pub async fn list_weather_forecasts(&self) -> Result<Vec<DbWeatherForecast>, StoreError> {
        self.call("ListWeatherForecasts", async {
            ractor::call!(self.actor, DbActorMessage::ListWeatherForecasts)
        })
        .await?
    }

    pub async fn create_transaction(&self, create: TransactionCreate) -> Result<i64, StoreError> {
        self.call("CreateTransaction", async {
            ractor::call!(self.actor, DbActorMessage::CreateTransaction, create)
        })
        .await?
    }

    pub async fn recent_transactions(&self, limit: u32) -> Result<Vec<DbTransaction>, StoreError> {
        self.call("RecentTransactions", async {
            ractor::call!(self.actor, DbActorMessage::RecentTransactions, limit)
        })
        .await?
    }

    /// Stops the actor; queued messages are dropped.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.pool.close().await;
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::ReadCameras(timestamp, reply) => {
                let res = sqlite::read_cameras(&state.pool, timestamp).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ReadCameraDetails(timestamp, camera_id, reply) => {
                let res = sqlite::read_camera_details(&state.pool, timestamp, &camera_id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Merge(timestamp, snapshot, reply) => {
                let res = self.merge(&state.pool, timestamp, &snapshot).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListAreas(reply) => {
                let _ = reply.send(sqlite::list_areas(&state.pool).await);
            }
            DbActorMessage::ListCameras(reply) => {
                let _ = reply.send(sqlite::list_cameras(&state.pool).await);
            }
            DbActorMessage::ListCameraImages(reply) => {
                let _ = reply.send(sqlite::list_camera_images(&state.pool).await);
            }
            DbActorMessage::ListWeatherForecasts(reply) => {
                let _ = reply.send(sqlite::list_weather_forecasts(&state.pool).await);
            }
            DbActorMessage::CreateTransaction(create, reply) => {
                let res = self.create_transaction(&state.pool, create).await;
                let _ = reply.send(res);
            }
            DbActorMessage::RecentTransactions(limit, reply) => {
                let _ = reply.send(sqlite::recent_transactions(&state.pool, limit).await);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn merge(
        &self,
        pool: &SqlitePool,
        timestamp: EpochMillis,
        snapshot: &SnapshotResult,
    ) -> Result<MergeSummary, StoreError> {
        let start = Instant::now();
        let plan = MergePlan::build(timestamp, snapshot)?;

        // Dropping the transaction on error rolls back every step.
        let mut tx = pool.begin().await?;
        let summary = {
            let mut writer = SqliteSnapshotWriter::new(&mut *tx);
            plan.apply(&mut writer).await?
        };
        tx.commit().await?;

        debug!(
            timestamp,
            steps = plan.steps().len(),
            areas = summary.areas,
            forecasts = summary.forecasts,
            cameras = summary.cameras,
            images = summary.images,
            took_ms = start.elapsed().as_millis() as u64,
            "Snapshot merged"
        );
        Ok(summary)
    }

    async fn create_transaction(
        &self,
        pool: &SqlitePool,
        create: TransactionCreate,
    ) -> Result<i64, StoreError> {
        let params = create.params.to_string();
        sqlite::insert_transaction(
            pool,
            &create.client_id,
            create.query_timestamp,
            &create.path,
            &params,
        )
        .await
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str, timeout: Duration) -> Result<DbActorHandle, StoreError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| StoreError::Actor(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor, timeout })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::Coordinates;
use crate::error::Error;

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub riders: usize,
    pub trips_per_rider: usize,
    pub workers: usize,
    /// probability that a rider fires a second, concurrent commit for the same fare
    pub duplicate_commit_probability: f64,
    pub center: Coordinates,
    /// standard deviation of trip endpoints around `center`, in degrees
    pub spread: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            riders: 100,
            trips_per_rider: 5,
            workers: 16,
            duplicate_commit_probability: 0.2,
            center: Coordinates::new(52.52, 13.405),
            spread: 0.05,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub previews: u64,
    pub preview_failures: u64,
    pub trips: u64,
    pub duplicate_commits: u64,
    pub already_committed: u64,
    pub expired: u64,
    pub other_failures: u64,
}

impl Report {
    fn record_commit(&mut self, result: Result<(), Error>) {
        match result {
            Ok(()) => self.trips += 1,
            Err(Error::FareAlreadyCommitted) => self.already_committed += 1,
            Err(Error::FareExpired) => self.expired += 1,
            Err(err) => {
                tracing::warn!("unexpected commit failure: {}", err);
                self.other_failures += 1;
            }
        }
    }
}

struct Simulation {
    api: DynAPI,
    config: SimulationConfig,
    endpoints: Normal<f64>,
    report: Mutex<Report>,
}

impl Simulation {
    fn sample_location(&self) -> Coordinates {
        let mut rng = rand::thread_rng();

        Coordinates::new(
            (self.config.center.latitude + self.endpoints.sample(&mut rng)).clamp(-90.0, 90.0),
            (self.config.center.longitude + self.endpoints.sample(&mut rng)).clamp(-180.0, 180.0),
        )
    }

    async fn commit(&self, user: User, fare_id: Uuid) -> Result<(), Error> {
        self.api.create_trip(user, fare_id).await.map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn ride(&self, user: User) {
        let pickup = self.sample_location();
        let destination = self.sample_location();

        let preview = match self.api.preview_trip(user.clone(), pickup, destination).await {
            Ok(preview) => preview,
            Err(err) => {
                tracing::warn!("preview failed: {}", err);
                let mut report = self.report.lock().await;
                report.previews += 1;
                report.preview_failures += 1;
                return;
            }
        };

        if preview.fares.is_empty() {
            self.report.lock().await.previews += 1;
            return;
        }

        let (fare_id, duplicate) = {
            let mut rng = rand::thread_rng();
            (
                preview.fares[rng.gen_range(0..preview.fares.len())].id,
                rng.gen_bool(self.config.duplicate_commit_probability),
            )
        };

        let results = if duplicate {
            let (first, second) = tokio::join!(
                self.commit(user.clone(), fare_id),
                self.commit(user.clone(), fare_id)
            );
            vec![first, second]
        } else {
            vec![self.commit(user, fare_id).await]
        };

        let mut report = self.report.lock().await;
        report.previews += 1;

        if duplicate {
            report.duplicate_commits += 1;
        }

        for result in results {
            report.record_commit(result);
        }
    }
}

/// Drives many riders against an engine through a shared work queue.
pub struct Executor {
    s: Arc<Simulation>,
}

impl Executor {
    #[tracing::instrument(name = "Executor::new", skip(api))]
    pub fn new(api: DynAPI, config: SimulationConfig) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&config.duplicate_commit_probability) {
            return Err(Error::InvalidRequest(
                "duplicate commit probability must be within [0, 1]".into(),
            ));
        }

        if config.workers == 0 {
            return Err(Error::InvalidRequest("at least one worker is required".into()));
        }

        let endpoints =
            Normal::new(0.0, config.spread).map_err(|err| Error::InvalidRequest(err.to_string()))?;

        Ok(Self {
            s: Arc::new(Simulation {
                api,
                config,
                endpoints,
                report: Mutex::new(Report::default()),
            }),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Report {
        let (tx, rx): (Sender<User>, Receiver<User>) = async_channel::unbounded();

        let mut handles = vec![];
        for _ in 0..self.s.config.workers {
            let rx = rx.clone();
            let s = self.s.clone();

            handles.push(tokio::spawn(async move {
                while let Ok(user) = rx.recv().await {
                    s.ride(user).await;
                }
            }));
        }

        let riders: Vec<User> = (0..self.s.config.riders)
            .map(|_| User::new(Uuid::new_v4().to_string()))
            .collect();

        for _ in 0..self.s.config.trips_per_rider {
            for rider in riders.iter() {
                // receivers outlive the producer, send only fails once the channel is closed
                if tx.send(rider.clone()).await.is_err() {
                    break;
                }
            }
        }

        tx.close();

        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                tracing::error!("simulation worker panicked: {}", err);
            }
        }

        let report = self.s.report.lock().await.clone();

        tracing::info!(?report, "simulation finished");

        report
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_commits_never_yield_a_second_trip() {
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::external::straight_line::StraightLineClient;
    use crate::store::{MemoryOfferStore, MemoryTripStore};

    let trips = Arc::new(MemoryTripStore::new());
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(StraightLineClient::default()),
        Arc::new(MemoryOfferStore::new()),
        trips.clone(),
    )
    .unwrap();

    let executor = Executor::new(
        Arc::new(engine),
        SimulationConfig {
            riders: 20,
            trips_per_rider: 3,
            workers: 8,
            duplicate_commit_probability: 0.5,
            ..SimulationConfig::default()
        },
    )
    .unwrap();

    let report = executor.run().await;

    assert_eq!(report.previews, 60);
    assert_eq!(report.preview_failures, 0);
    assert_eq!(report.trips, 60);
    assert_eq!(report.already_committed, report.duplicate_commits);
    assert_eq!(report.expired, 0);
    assert_eq!(report.other_failures, 0);
    assert_eq!(trips.len().await, 60);
}

#[test]
fn invalid_simulation_settings_are_rejected() {
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::external::straight_line::StraightLineClient;
    use crate::store::{MemoryOfferStore, MemoryTripStore};

    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(StraightLineClient::default()),
        Arc::new(MemoryOfferStore::new()),
        Arc::new(MemoryTripStore::new()),
    )
    .unwrap();
    let api: DynAPI = Arc::new(engine);

    let config = SimulationConfig {
        duplicate_commit_probability: 1.5,
        ..SimulationConfig::default()
    };
    assert!(Executor::new(api.clone(), config).is_err());

    let config = SimulationConfig {
        spread: -1.0,
        ..SimulationConfig::default()
    };
    assert!(Executor::new(api.clone(), config).is_err());
}

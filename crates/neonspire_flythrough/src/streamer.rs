use std::fs;
use std::io;
use std::path::Path;

use glam::{Vec2, Vec3};
use neonspire_core::events::{self, EventReceiver, EventSender};
use neonspire_core::jobs::JobSystem;
use neonspire_shared::{ChunkContent, ChunkCoord, CityGenerator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MIN_LOAD_DISTANCE: f32 = 10.0;
const MAX_LOAD_DISTANCE: f32 = 5_000.0;
const MAX_WORKER_THREADS: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_world_seed")]
    pub world_seed: u64,
    #[serde(default = "default_load_distance")]
    pub load_distance: f32,
    #[serde(default = "default_unload_distance")]
    pub unload_distance: f32,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            world_seed: default_world_seed(),
            load_distance: default_load_distance(),
            unload_distance: default_unload_distance(),
            worker_threads: None,
        }
    }
}

impl StreamSettings {
    pub fn sanitize(mut self) -> Self {
        self.load_distance = self.load_distance.clamp(MIN_LOAD_DISTANCE, MAX_LOAD_DISTANCE);
        self.unload_distance = self
            .unload_distance
            .clamp(self.load_distance, MAX_LOAD_DISTANCE * 2.0);
        self.worker_threads = self
            .worker_threads
            .map(|count| count.clamp(1, MAX_WORKER_THREADS));
        self
    }

    pub fn from_toml_str(contents: &str) -> io::Result<Self> {
        let parsed = toml::from_str::<Self>(contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize stream settings: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

fn default_world_seed() -> u64 {
    42
}

fn default_load_distance() -> f32 {
    150.0
}

fn default_unload_distance() -> f32 {
    200.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    ChunkLoaded(ChunkCoord),
    ChunkUnloaded(ChunkCoord),
    ObserverMoved {
        from: Option<ChunkCoord>,
        to: ChunkCoord,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamDelta {
    pub loaded: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

pub struct ChunkStreamer {
    settings: StreamSettings,
    current: Option<ChunkCoord>,
    events: EventSender<StreamEvent>,
}

impl ChunkStreamer {
    pub fn new(settings: StreamSettings) -> (Self, EventReceiver<StreamEvent>) {
        let (events, receiver) = events::channel();
        let streamer = Self {
            settings: settings.sanitize(),
            current: None,
            events,
        };
        (streamer, receiver)
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    pub fn current_chunk(&self) -> Option<ChunkCoord> {
        self.current
    }

    pub fn update(&mut self, city: &mut CityGenerator, jobs: &JobSystem, observer: Vec3) -> StreamDelta {
        let chunk_size = city.chunk_size();
        let here = city.world_to_chunk(observer);
        let ground = Vec2::new(observer.x, observer.z);
        if self.current != Some(here) {
            debug!("observer entered chunk ({}, {})", here.x, here.z);
            self.events.send(StreamEvent::ObserverMoved {
                from: self.current,
                to: here,
            });
            self.current = Some(here);
        }

        let mut delta = StreamDelta::default();

        let mut stale: Vec<ChunkCoord> = city
            .loaded_chunks()
            .filter(|&coord| {
                coord != here
                    && coord.world_center(chunk_size).distance(ground) > self.settings.unload_distance
            })
            .collect();
        stale.sort_unstable();
        for coord in stale {
            if city.remove_chunk(coord) {
                self.events.send(StreamEvent::ChunkUnloaded(coord));
                delta.unloaded.push(coord);
            }
        }

        let wanted = self.missing_chunks(city, here, ground);
        let world_seed = self.settings.world_seed;
        let config = city.config().clone();
        let contents = jobs.map(&wanted, |&coord| {
            ChunkContent::generate(coord, world_seed, &config)
        });
        for content in contents {
            let coord = content.coord;
            if city.commit_chunk(content) {
                self.events.send(StreamEvent::ChunkLoaded(coord));
                delta.loaded.push(coord);
            }
        }

        if !delta.is_empty() {
            info!(
                "streamed +{} / -{} chunks around ({}, {}), {} loaded",
                delta.loaded.len(),
                delta.unloaded.len(),
                here.x,
                here.z,
                city.loaded_chunk_count()
            );
        }
        delta
    }

    fn missing_chunks(&self, city: &CityGenerator, here: ChunkCoord, ground: Vec2) -> Vec<ChunkCoord> {
        let chunk_size = city.chunk_size();
        let reach = (self.settings.load_distance / chunk_size).ceil() as i32 + 1;

        let mut wanted: Vec<(f32, ChunkCoord)> = Vec::new();
        for dx in -reach..=reach {
            for dz in -reach..=reach {
                let Some(coord) = here.offset(dx, dz) else {
                    continue;
                };
                if city.is_chunk_loaded(coord) {
                    continue;
                }
                let distance = coord.world_center(chunk_size).distance(ground);
                if coord == here || distance <= self.settings.load_distance {
                    wanted.push((distance, coord));
                }
            }
        }
        wanted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        wanted.into_iter().map(|(_, coord)| coord).collect()
    }
}

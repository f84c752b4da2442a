//! Fixed-interval physics tick thread
//!
//! Runs the world on its own timer, independent of the render/update loop.
//! Re-entrancy is handled by `try_lock`: if the previous tick still holds the
//! world when the next is due, the new tick is skipped whole. There is no
//! backlog and no catch-up for skipped or missed ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::world::PhysicsWorld;
use super::PhysicsError;

/// Handle to the dedicated physics thread
///
/// Stops the thread and joins it on drop, so the world is never ticked after
/// the handle is gone.
pub struct PhysicsRunner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PhysicsRunner {
    /// Spawn the tick thread at the given fixed timestep
    pub fn start(world: Arc<Mutex<PhysicsWorld>>, fixed_dt: f32) -> Result<Self, PhysicsError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("physics-tick".into())
            .spawn(move || tick_loop(&world, &flag, fixed_dt))
            .map_err(PhysicsError::ThreadSpawn)?;

        log::info!("physics tick thread started at {:.1} Hz", 1.0 / fixed_dt);
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the tick thread and wait for it to finish
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("physics tick thread panicked during shutdown");
            }
        }
    }
}

impl Drop for PhysicsRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(world: &Arc<Mutex<PhysicsWorld>>, running: &AtomicBool, fixed_dt: f32) {
    let interval = Duration::from_secs_f32(fixed_dt);
    let mut next_tick = Instant::now() + interval;
    let mut skipped: u64 = 0;

    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now < next_tick {
            thread::sleep(next_tick - now);
        }

        match world.try_lock() {
            Ok(mut world) => world.step(fixed_dt),
            Err(TryLockError::WouldBlock) => {
                // Previous tick (or a render-side reader) still holds the
                // world; drop this tick entirely.
                skipped += 1;
                log::debug!("physics tick skipped, world busy ({skipped} skipped so far)");
            }
            Err(TryLockError::Poisoned(_)) => {
                log::warn!("physics world lock poisoned; stopping tick thread");
                break;
            }
        }

        next_tick += interval;
        let now = Instant::now();
        if next_tick < now {
            // Fell behind: missed ticks are dropped, not replayed.
            next_tick = now + interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    #[test]
    fn test_runner_ticks_and_stops() {
        crate::foundation::logging::init();

        let config = PhysicsConfig::default();
        let fixed_dt = config.fixed_timestep;
        let world = Arc::new(Mutex::new(PhysicsWorld::new(config)));

        let mut runner = PhysicsRunner::start(Arc::clone(&world), fixed_dt).expect("spawn");
        thread::sleep(Duration::from_millis(100));
        runner.stop();

        let ticks = world.lock().expect("world").stats().tick_count;
        assert!(ticks > 0, "runner should have executed at least one tick");

        // Stopped: no more ticks accumulate.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(world.lock().expect("world").stats().tick_count, ticks);
    }

    #[test]
    fn test_busy_world_skips_ticks_without_blocking() {
        let config = PhysicsConfig::default();
        let fixed_dt = config.fixed_timestep;
        let world = Arc::new(Mutex::new(PhysicsWorld::new(config)));

        // Hold the world across several tick intervals.
        let guard = world.lock().expect("world");
        let mut runner = PhysicsRunner::start(Arc::clone(&world), fixed_dt).expect("spawn");
        thread::sleep(Duration::from_millis(80));
        drop(guard);

        thread::sleep(Duration::from_millis(80));
        runner.stop();

        // Ticks resumed after the world freed up; the held window produced
        // none and was not replayed.
        let ticks = world.lock().expect("world").stats().tick_count;
        assert!(ticks > 0);
        assert!(ticks < 10, "skipped ticks must not be queued, saw {ticks}");
    }
}

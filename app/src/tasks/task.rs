use std::io;
use std::sync::{Arc, Barrier};

pub struct TaskMeta {
    pub name: &'static str,
    pub stack_bytes: Option<usize>,
}

pub trait AppTask {
    fn meta(&self) -> TaskMeta;

    /// Consume the task and return the closure that runs its loop.
    fn into_runner(self: Box<Self>) -> Box<dyn FnOnce() + Send + 'static>;
}

pub trait Spawner {
    fn spawn(&self, meta: TaskMeta, f: Box<dyn FnOnce() + Send + 'static>) -> io::Result<()>;
}

/// Spawn every task, then release them together so none runs against a
/// peer that does not exist yet.
pub fn start_all(tasks: Vec<Box<dyn AppTask>>) -> io::Result<()> {
    let spawner = TaskSpawner;

    // Build all runners first to heap allocate tasks before they run
    let runners: Vec<(TaskMeta, Box<dyn FnOnce() + Send>)> = tasks
        .into_iter()
        .map(|t| (t.meta(), t.into_runner()))
        .collect();

    // +1 for the supervisor/main thread to release everybody
    let barrier = Arc::new(Barrier::new(runners.len() + 1));

    for (meta, runner) in runners {
        let b = barrier.clone();
        let name = meta.name;
        let spawned = spawner.spawn(meta, Box::new(move || {
            b.wait();
            runner();
        }));

        if let Err(err) = spawned {
            // Peers spawned so far stay parked on the barrier.
            log::error!("failed to spawn task {name}: {err}");
            return Err(err);
        }
        log::debug!("spawned task {name}");
    }

    barrier.wait();
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
mod spawner {
    use std::io;

    use super::{Spawner, TaskMeta};

    pub struct HostSpawner;

    impl Spawner for HostSpawner {
        fn spawn(&self, meta: TaskMeta, f: Box<dyn FnOnce() + Send + 'static>) -> io::Result<()> {
            let mut b = std::thread::Builder::new().name(meta.name.into());
            if let Some(stack_sz) = meta.stack_bytes {
                b = b.stack_size(stack_sz);
            }

            b.spawn(f).map(|_| ())
        }
    }
}
#[cfg(not(target_os = "espidf"))]
pub use spawner::HostSpawner as TaskSpawner;

#[cfg(target_os = "espidf")]
mod spawner {
    use esp_idf_svc::sys::{
        esp_err_t, esp_pthread_cfg_t, esp_pthread_get_cfg, esp_pthread_get_default_config,
        esp_pthread_set_cfg, ESP_OK,
    };
    use std::ffi::{c_char, CString};
    use std::io;

    use super::{Spawner, TaskMeta};

    pub struct EspSpawner;

    impl Spawner for EspSpawner {
        fn spawn(&self, meta: TaskMeta, f: Box<dyn FnOnce() + Send + 'static>) -> io::Result<()> {
            let mut b = std::thread::Builder::new();
            if let Some(stack_sz) = meta.stack_bytes {
                b = b.stack_size(stack_sz);
            }

            with_next_pthread_cfg(meta, || b.spawn(f))
                .map_err(|err| io::Error::other(format!("esp_pthread_set_cfg: {err}")))?
                .map(|_| ())
        }
    }

    /// FreeRTOS takes the task name and stack from the pthread config in
    /// effect when the thread is created.
    fn with_next_pthread_cfg<T>(meta: TaskMeta, f: impl FnOnce() -> T) -> Result<T, esp_err_t> {
        let cname = CString::new(meta.name).map_err(|_| esp_idf_svc::sys::ESP_ERR_INVALID_ARG)?;

        unsafe {
            // Save current per-thread config
            let mut prev: esp_pthread_cfg_t = core::mem::zeroed();
            let had_prev = esp_pthread_get_cfg(&mut prev) == ESP_OK;

            let mut cfg = if had_prev {
                prev
            } else {
                esp_pthread_get_default_config()
            };

            cfg.thread_name = cname.as_ptr() as *const c_char;

            if let Some(stack) = meta.stack_bytes {
                cfg.stack_size = stack;
            }

            let ret = esp_pthread_set_cfg(&cfg);
            if ret != ESP_OK {
                return Err(ret);
            }

            let out = f();

            // Restore previous config for subsequent spawns from this thread.
            let restore = if had_prev { prev } else { esp_pthread_get_default_config() };
            let _ = esp_pthread_set_cfg(&restore);

            Ok(out)
        }
    }
}
#[cfg(target_os = "espidf")]
pub use spawner::EspSpawner as TaskSpawner;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    struct Echo {
        name: &'static str,
        tx: Sender<&'static str>,
    }

    impl AppTask for Echo {
        fn meta(&self) -> TaskMeta {
            TaskMeta {
                name: self.name,
                stack_bytes: Some(64 * 1024),
            }
        }

        fn into_runner(self: Box<Self>) -> Box<dyn FnOnce() + Send + 'static> {
            Box::new(move || {
                let _ = self.tx.send(self.name);
            })
        }
    }

    #[test]
    fn start_all_runs_every_task() {
        let (tx, rx) = channel();
        let tasks: Vec<Box<dyn AppTask>> = vec![
            Box::new(Echo { name: "a", tx: tx.clone() }),
            Box::new(Echo { name: "b", tx }),
        ];

        start_all(tasks).unwrap();

        let mut seen = vec![
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        seen.sort();
        assert_eq!(seen, ["a", "b"]);
    }
}

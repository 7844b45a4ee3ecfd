pub use tokio;

pub mod assets;
pub mod color;
pub mod time;

pub use assets::Handle;
pub use color::{Color, ColorParseError};

/// Cloneable ticket into the dedicated I/O runtime.
/// Anything that loads from disk or network spawns through this.
#[derive(Clone)]
pub struct IoTaskPool(pub tokio::runtime::Handle);

impl IoTaskPool {
    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.0
    }
}

/// The Engine Application
/// Owns the I/O runtime. The host thread stays free for extraction and
/// selection; async work only ever talks back through channels.
pub struct App {
    pub running: bool,
    io_runtime: tokio::runtime::Runtime,
}

impl App {
    pub fn new() -> std::io::Result<Self> {
        Self::with_io_threads(2)
    }

    pub fn with_io_threads(threads: usize) -> std::io::Result<Self> {
        // Dedicated multi-threaded pool for I/O. Catalog and model loads never
        // run on the host thread.
        let io_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .enable_all()
            .thread_name("tailor-io")
            .build()?;

        log::debug!("[App] I/O runtime started with {} worker(s)", threads.max(1));

        Ok(Self {
            running: true,
            io_runtime,
        })
    }

    pub fn io_pool(&self) -> IoTaskPool {
        IoTaskPool(self.io_runtime.handle().clone())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed pool of single-threaded Tokio runtimes, one per OS thread,
/// modeling section 5's "single-threaded cooperative within each context;
/// multiple contexts run in parallel on a pool of OS threads". Each handler
/// is spawned onto exactly one context for its lifetime via
/// [`ContextPool::next`].
pub struct ContextPool {
    handles: Vec<tokio::runtime::Handle>,
    runtimes: Vec<tokio::runtime::Runtime>,
    next: AtomicUsize,
}

impl ContextPool {
    pub fn new(size: usize) -> std::io::Result<Self> {
        assert!(size > 0, "context pool size must be at least 1");
        let mut handles = Vec::with_capacity(size);
        let mut runtimes = Vec::with_capacity(size);
        for _ in 0..size {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            handles.push(runtime.handle().clone());
            runtimes.push(runtime);
        }
        Ok(Self { handles, runtimes, next: AtomicUsize::new(0) })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Round-robins across contexts; returns the handle a caller should
    /// spawn this request's handler onto.
    pub fn next(&self) -> &tokio::runtime::Handle {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.handles.len();
        &self.handles[index]
    }

    /// Keeps every context's reactor alive by driving it on its own thread
    /// until the pool is dropped.
    pub fn drive_in_background(&self) -> Vec<std::thread::JoinHandle<()>> {
        self.runtimes
            .iter()
            .map(|runtime| {
                let handle = runtime.handle().clone();
                std::thread::spawn(move || {
                    handle.block_on(async {
                        let _ = tokio::signal::ctrl_c().await;
                    });
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robins_across_every_context() {
        let pool = ContextPool::new(3).unwrap();
        let seen: Vec<_> = (0..6).map(|_| format!("{:p}", pool.next())).collect();
        assert_eq!(seen[0], seen[3]);
        assert_eq!(seen[1], seen[4]);
        assert_eq!(seen[2], seen[5]);
        assert_ne!(seen[0], seen[1]);
    }
}

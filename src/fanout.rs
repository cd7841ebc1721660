use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use tracing::{debug, error};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::PathwayCode;
use crate::error::KeggError;
use crate::kegg::KeggClient;

/// Result of one KGML download, tagged with the pathway it belongs to.
#[derive(Debug)]
pub struct PathwayFetch {
    pub pathway: PathwayCode,
    pub outcome: Result<String, KeggError>,
}

/// Downloads the KGML of every pathway on at most `concurrency` worker threads.
///
/// Returns one [`PathwayFetch`] per input code once every worker has finished.
/// Results arrive in completion order, not input order.
pub fn fetch_all<K: KeggClient>(
    client: &K,
    pathways: &[PathwayCode],
    concurrency: usize,
    sink: &dyn ProgressSink,
) -> Vec<PathwayFetch> {
    let total = pathways.len();
    let workers = concurrency.max(1).min(total);
    let started = Instant::now();
    let cursor = AtomicUsize::new(0);
    let mut fetches = Vec::with_capacity(total);

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        let handles = (0..workers)
            .map(|worker| {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move || {
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(pathway) = pathways.get(index) else {
                            break;
                        };
                        debug!(worker, pathway = %pathway, "fetching KGML");
                        let outcome = client.fetch_pathway_kgml(pathway);
                        if tx
                            .send(PathwayFetch {
                                pathway: pathway.clone(),
                                outcome,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        drop(tx);

        for fetch in rx {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Fetch; {}/{} {}",
                    fetches.len() + 1,
                    total,
                    fetch.pathway
                ),
                elapsed: Some(started.elapsed()),
            });
            fetches.push(fetch);
        }

        for handle in handles {
            if handle.join().is_err() {
                error!("KGML fetch worker panicked");
            }
        }
    });

    if fetches.len() < total {
        let reported: HashSet<PathwayCode> =
            fetches.iter().map(|fetch| fetch.pathway.clone()).collect();
        let missing = pathways
            .iter()
            .filter(|pathway| !reported.contains(*pathway))
            .map(|pathway| PathwayFetch {
                pathway: pathway.clone(),
                outcome: Err(KeggError::WorkerPanicked(pathway.to_string())),
            })
            .collect::<Vec<_>>();
        fetches.extend(missing);
    }
    fetches
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::OrganismCode;

    struct RecordingSink(Mutex<Vec<String>>);

    impl ProgressSink for RecordingSink {
        fn event(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event.message);
        }
    }

    struct EchoClient;

    impl KeggClient for EchoClient {
        fn fetch_pathway_list(&self, _organism: &OrganismCode) -> Result<String, KeggError> {
            Err(KeggError::KeggHttp("not used".to_string()))
        }

        fn fetch_pathway_kgml(&self, pathway: &PathwayCode) -> Result<String, KeggError> {
            if pathway.as_str() == "hsa99999" {
                panic!("simulated worker crash");
            }
            Ok(format!("body-{pathway}"))
        }
    }

    #[test]
    fn progress_reported_per_pathway() {
        let pathways: Vec<PathwayCode> = ["hsa00010", "hsa00020"]
            .iter()
            .map(|code| code.parse().unwrap())
            .collect();
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let fetches = fetch_all(&EchoClient, &pathways, 0, &sink);
        assert_eq!(fetches.len(), 2);
        let messages = sink.0.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("phase=Fetch; 1/2 "));
        assert!(messages[1].starts_with("phase=Fetch; 2/2 "));
    }

    #[test]
    fn panicking_worker_yields_tagged_failure() {
        let pathways: Vec<PathwayCode> = ["hsa00010", "hsa99999", "hsa00030"]
            .iter()
            .map(|code| code.parse().unwrap())
            .collect();
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let fetches = fetch_all(&EchoClient, &pathways, 1, &sink);
        assert_eq!(fetches.len(), 3);
        let crashed = fetches
            .iter()
            .find(|fetch| fetch.pathway.as_str() == "hsa99999")
            .unwrap();
        assert!(matches!(crashed.outcome, Err(KeggError::WorkerPanicked(_))));
    }
}

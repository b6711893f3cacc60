#![no_main]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use libfuzzer_sys::fuzz_target;
use ureq_call::http::{Method, Request, Response};
use ureq_call::{
    BoxError, Call, CallState, Completion, Error, Exchange, RawResponse, Transport, Utf8Body,
};

// List of HTTP methods to randomly choose from
const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"];

// List of status codes the transport answers with
const STATUS_CODES: &[u16] = &[200, 201, 204, 205, 302, 404, 500, 503];

// Bodies, one of which is not valid UTF-8
const BODIES: &[&[u8]] = &[b"", b"hello", b"\xFF\xFE"];

/// Transport driven by fuzz data. Completes inline, or holds the completion
/// until it is aborted or the next operation releases it.
struct FuzzTransport {
    data: Vec<u8>,
    pos: AtomicUsize,
    parked: Arc<Mutex<Vec<Completion>>>,
}

impl FuzzTransport {
    fn next(&self) -> u8 {
        let i = self.pos.fetch_add(1, Ordering::Relaxed);
        self.data.get(i % self.data.len().max(1)).copied().unwrap_or(0)
    }
}

struct FuzzExchange {
    outcome: Mutex<Option<io::Result<RawResponse>>>,
    park: bool,
    parked: Arc<Mutex<Vec<Completion>>>,
}

impl Transport<()> for FuzzTransport {
    fn new_exchange(&self, _: Arc<Request<()>>) -> Result<Arc<dyn Exchange>, BoxError> {
        let b = self.next();
        if b % 13 == 0 {
            return Err("refused".into());
        }

        let outcome = if b % 5 == 0 {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        } else {
            let status = STATUS_CODES[(self.next() as usize) % STATUS_CODES.len()];
            let body = BODIES[(self.next() as usize) % BODIES.len()];
            Ok(Response::builder()
                .status(status)
                .body(body.to_vec())
                .expect("valid response"))
        };

        Ok(Arc::new(FuzzExchange {
            outcome: Mutex::new(Some(outcome)),
            park: b % 3 == 0,
            parked: self.parked.clone(),
        }))
    }
}

impl Exchange for FuzzExchange {
    fn execute(&self) -> io::Result<RawResponse> {
        self.outcome
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::Other, "reused")))
    }

    fn enqueue(&self, completion: Completion) {
        if self.park {
            self.parked.lock().unwrap().push(completion);
        } else {
            completion.complete(self.execute());
        }
    }

    fn abort(&self) {
        let mut outcome = self.outcome.lock().unwrap();
        *outcome = Some(Err(io::Error::new(io::ErrorKind::Interrupted, "aborted")));
    }
}

fuzz_target!(|data: &[u8]| {
    // Ensure we have enough data to work with
    if data.len() < 4 {
        return;
    }

    let method = Method::from_bytes(METHODS[(data[0] as usize) % METHODS.len()].as_bytes())
        .expect("valid method");
    let request = match Request::builder()
        .method(method)
        .uri("http://example.com/test")
        .body(())
    {
        Ok(v) => v,
        Err(_) => return,
    };

    let parked = Arc::new(Mutex::new(Vec::new()));
    let transport = Arc::new(FuzzTransport {
        data: data.to_vec(),
        pos: AtomicUsize::new(1),
        parked: parked.clone(),
    });

    let call: Call<String> = Call::new(request, transport, Arc::new(Utf8Body));
    let mut calls = vec![call];
    let delivered = Arc::new(AtomicUsize::new(0));
    let mut enqueued = 0;

    for op in &data[1..] {
        let idx = (*op as usize >> 3) % calls.len();
        let call = &calls[idx];
        let was_executed = call.is_executed();
        let was_canceled = call.is_canceled();

        match op % 6 {
            0 => match call.execute() {
                Err(Error::AlreadyExecuted) => assert!(was_executed),
                Err(Error::Canceled) => assert!(call.is_canceled()),
                _ => assert!(!was_executed && !was_canceled),
            },
            1 => {
                let delivered = delivered.clone();
                match call.enqueue(move |_| {
                    delivered.fetch_add(1, Ordering::SeqCst);
                }) {
                    Ok(()) => {
                        assert!(!was_executed);
                        enqueued += 1;
                    }
                    Err(e) => {
                        assert!(was_executed);
                        assert!(matches!(e, Error::AlreadyExecuted));
                    }
                }
            }
            2 => {
                call.cancel();
                assert!(call.is_canceled());
            }
            3 => {
                let clone = call.clone();
                assert_eq!(clone.state(), CallState::Created);
                assert!(!clone.is_canceled());
                assert_eq!(clone.request().method(), call.request().method());
                calls.push(clone);
            }
            4 => {
                // Release one parked completion.
                let c = parked.lock().unwrap().pop();
                if let Some(c) = c {
                    c.complete(Err(io::Error::new(io::ErrorKind::TimedOut, "late")));
                }
            }
            _ => {
                // Transport loses a parked completion.
                let c = parked.lock().unwrap().pop();
                drop(c);
            }
        }

        let call = &calls[idx];
        // Canceled stays canceled, executed stays executed.
        assert!(!was_canceled || call.is_canceled());
        assert!(!was_executed || call.is_executed());
    }

    // Everything still parked is dropped, which must still notify.
    parked.lock().unwrap().clear();

    assert_eq!(delivered.load(Ordering::SeqCst), enqueued);
});

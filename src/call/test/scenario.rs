use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use http::{Method, Request};
use parking_lot::{Condvar, Mutex};

use crate::convert::Utf8Body;
use crate::transport::{Completion, Exchange, RawResponse, Transport};
use crate::{BoxError, Call};

/// What the stub exchange ends with.
#[derive(Debug, Clone)]
pub enum Outcome {
    Respond(u16, &'static [u8]),
    Fail(io::ErrorKind),
}

#[derive(Debug, Clone)]
struct Plan {
    delay: Duration,
    outcome: Outcome,
    respect_abort: bool,
    drop_completion: bool,
    fail_create: bool,
}

/// Counters shared by the stub transport and all its exchanges.
#[derive(Debug, Default)]
pub struct Record {
    pub exchanges: AtomicUsize,
    pub submissions: AtomicUsize,
    pub aborts: AtomicUsize,
    pub uris: Mutex<Vec<String>>,
}

impl Record {
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

pub struct StubTransport {
    plan: Plan,
    record: Arc<Record>,
}

impl<B> Transport<B> for StubTransport {
    fn new_exchange(&self, request: Arc<Request<B>>) -> Result<Arc<dyn Exchange>, BoxError> {
        if self.plan.fail_create {
            return Err("stub refuses request".into());
        }

        self.record.exchanges.fetch_add(1, Ordering::SeqCst);
        self.record.uris.lock().push(request.uri().to_string());

        Ok(Arc::new(StubExchange {
            inner: Arc::new(ExchangeInner {
                plan: self.plan.clone(),
                record: self.record.clone(),
                aborted: Mutex::new(false),
                wake: Condvar::new(),
            }),
        }))
    }
}

struct StubExchange {
    inner: Arc<ExchangeInner>,
}

struct ExchangeInner {
    plan: Plan,
    record: Arc<Record>,
    aborted: Mutex<bool>,
    wake: Condvar,
}

impl ExchangeInner {
    fn run(&self) -> io::Result<RawResponse> {
        self.record.submissions.fetch_add(1, Ordering::SeqCst);

        let deadline = Instant::now() + self.plan.delay;
        let mut aborted = self.aborted.lock();

        loop {
            if *aborted && self.plan.respect_abort {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "aborted"));
            }
            if self.wake.wait_until(&mut aborted, deadline).timed_out() {
                break;
            }
        }

        if *aborted && self.plan.respect_abort {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "aborted"));
        }

        match &self.plan.outcome {
            Outcome::Respond(status, body) => Ok(http::Response::builder()
                .status(*status)
                .body(body.to_vec())
                .expect("stub response")),
            Outcome::Fail(kind) => Err(io::Error::new(*kind, "stub failure")),
        }
    }
}

impl Exchange for StubExchange {
    fn execute(&self) -> io::Result<RawResponse> {
        self.inner.run()
    }

    fn enqueue(&self, completion: Completion) {
        let inner = self.inner.clone();
        thread::spawn(move || {
            if inner.plan.drop_completion {
                inner.record.submissions.fetch_add(1, Ordering::SeqCst);
                drop(completion);
                return;
            }
            let outcome = inner.run();
            completion.complete(outcome);
        });
    }

    fn abort(&self) {
        self.inner.record.aborts.fetch_add(1, Ordering::SeqCst);
        *self.inner.aborted.lock() = true;
        self.inner.wake.notify_all();
    }
}

pub struct Scenario {
    pub call: Call<String>,
    pub record: Arc<Record>,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::new()
    }
}

pub struct ScenarioBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    plan: Plan,
}

#[allow(unused)]
impl ScenarioBuilder {
    fn new() -> Self {
        ScenarioBuilder {
            method: Method::GET,
            uri: "https://q.test/".to_string(),
            headers: vec![],
            plan: Plan {
                delay: Duration::ZERO,
                outcome: Outcome::Respond(200, b"ok"),
                respect_abort: false,
                drop_completion: false,
                fail_create: false,
            },
        }
    }

    pub fn get(self, uri: &str) -> Self {
        self.method(Method::GET, uri)
    }

    pub fn post(self, uri: &str) -> Self {
        self.method(Method::POST, uri)
    }

    pub fn method(mut self, method: Method, uri: &str) -> Self {
        self.method = method;
        self.uri = uri.to_string();
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.plan.delay = delay;
        self
    }

    pub fn respond(mut self, status: u16, body: &'static [u8]) -> Self {
        self.plan.outcome = Outcome::Respond(status, body);
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.plan.outcome = Outcome::Fail(kind);
        self
    }

    pub fn respect_abort(mut self) -> Self {
        self.plan.respect_abort = true;
        self
    }

    pub fn drop_completion(mut self) -> Self {
        self.plan.drop_completion = true;
        self
    }

    pub fn fail_create(mut self) -> Self {
        self.plan.fail_create = true;
        self
    }

    pub fn build(self) -> Scenario {
        let mut req = Request::builder().method(self.method).uri(&self.uri);
        for (k, v) in &self.headers {
            req = req.header(k, v);
        }
        let request = req.body(()).unwrap();

        let record = Arc::new(Record::default());
        let transport = Arc::new(StubTransport {
            plan: self.plan,
            record: record.clone(),
        });

        let call: Call<String> = Call::new(request, transport, Arc::new(Utf8Body));

        Scenario { call, record }
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::{collections::VecDeque, sync::Mutex};

    use serde_json::{json, Value};

    use crate::transport::{BackendFault, HttpBackend, HttpRequest, HttpResponse};

    #[derive(Debug, Clone)]
    pub enum Reply {
        Response(HttpResponse),
        Fault(BackendFault),
    }

    impl Reply {
        pub fn json(body: Value) -> Self {
            Reply::Response(HttpResponse { status: 200, body: body.to_string() })
        }

        pub fn status(status: u16, body: &str) -> Self {
            Reply::Response(HttpResponse { status, body: body.to_string() })
        }

        pub fn connect_refused() -> Self {
            Reply::Fault(BackendFault::Connect("connection refused".into()))
        }

        pub fn timeout() -> Self {
            Reply::Fault(BackendFault::Timeout("operation timed out".into()))
        }

        pub fn running(handle: &str) -> Self {
            Reply::json(json!({"requestID": "r-1", "status": "running", "handle": handle}))
        }

        pub fn status_running() -> Self {
            Reply::json(json!({"status": "running"}))
        }

        pub fn status_success(handle: &str) -> Self {
            Reply::json(json!({"status": "success", "handle": handle}))
        }

        pub fn results(results: Value) -> Self {
            Reply::json(json!({"requestID": "r-1", "status": "success", "results": results}))
        }

        pub fn failed(msg: &str) -> Self {
            Reply::json(json!({"status": "failed", "errors": [{"code": 1, "msg": msg}]}))
        }
    }

    /// Plays back canned replies in order and records every request it is
    /// given. Running out of replies is a connection fault.
    #[derive(Debug, Default)]
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self { replies: Mutex::new(replies.into()), requests: Mutex::new(vec![]) }
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn count_paths(&self, fragment: &str) -> usize {
            self.requests().iter().filter(|r| r.url.path().contains(fragment)).count()
        }

        pub fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    impl HttpBackend for ScriptedBackend {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BackendFault> {
            self.requests.lock().unwrap().push(request.clone());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Response(response)) => Ok(response),
                Some(Reply::Fault(fault)) => Err(fault),
                None => Err(BackendFault::Connect("script exhausted".into())),
            }
        }
    }
}

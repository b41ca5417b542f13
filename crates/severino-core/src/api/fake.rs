//! Scripted in-memory portal for exercising the session and clock-in logic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ClockInForm, Portal, PortalResponse, TransportError};

type Reply = Result<PortalResponse, TransportError>;

#[derive(Default)]
pub struct FakePortal {
    auth_replies: Mutex<VecDeque<Reply>>,
    clock_in_replies: Mutex<VecDeque<Reply>>,
    auth_calls: AtomicUsize,
    clock_in_calls: AtomicUsize,
    cookie_headers: Mutex<Vec<String>>,
    forms: Mutex<Vec<ClockInForm>>,
}

impl FakePortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_auth(&self, reply: Reply) -> &Self {
        self.auth_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_clock_in(&self, reply: Reply) -> &Self {
        self.clock_in_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn clock_in_calls(&self) -> usize {
        self.clock_in_calls.load(Ordering::SeqCst)
    }

    pub fn cookie_headers(&self) -> Vec<String> {
        self.cookie_headers.lock().unwrap().clone()
    }

    pub fn forms(&self) -> Vec<ClockInForm> {
        self.forms.lock().unwrap().clone()
    }
}

/// A response with the given status and no cookies
pub fn status(status: u16) -> PortalResponse {
    PortalResponse {
        status,
        status_text: String::new(),
        set_cookies: Vec::new(),
        body: String::new(),
    }
}

/// A 200 authentication response issuing the given `Set-Cookie` headers
pub fn login(set_cookies: &[&str]) -> PortalResponse {
    PortalResponse {
        set_cookies: set_cookies.iter().map(|c| c.to_string()).collect(),
        ..status(200)
    }
}

#[async_trait]
impl Portal for FakePortal {
    async fn authenticate(&self, _company_code: &str, _tax_id: &str) -> Reply {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected authentication call"))
    }

    async fn submit_clock_in(&self, cookie_header: &str, form: &ClockInForm) -> Reply {
        self.clock_in_calls.fetch_add(1, Ordering::SeqCst);
        self.cookie_headers
            .lock()
            .unwrap()
            .push(cookie_header.to_string());
        self.forms.lock().unwrap().push(form.clone());
        self.clock_in_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected clock-in call"))
    }
}

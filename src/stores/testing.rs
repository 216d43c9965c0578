//! Scripted service fakes shared by the store tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::api::{BalanceService, ChatService, MetricsService};
use crate::error::{DomainError, Result};
use crate::models::{
    Balance, ChatRequest, ChatResponse, CreateBalanceRequest, CurrentMonthMetrics, DeltaMetrics,
    MetricsSummary, MonthRange, MonthlyDelta,
};

enum Reply<T> {
    Ready(Result<T>),
    Deferred(oneshot::Receiver<Result<T>>),
}

/// Queue of replies handed out one per call, in order.
pub(crate) struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Script<T> {
    pub(crate) fn push(&self, reply: Result<T>) {
        self.replies.lock().unwrap().push_back(Reply::Ready(reply));
    }

    /// Queue a reply that is only delivered once the returned sender fires.
    pub(crate) fn defer(&self) -> oneshot::Sender<Result<T>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Deferred(rx));
        tx
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(DomainError::new("reply dropped", None))),
            None => Err(DomainError::new("unscripted call", None)),
        }
    }
}

pub(crate) fn balance(id: i64, date: &str, amount: f64) -> Balance {
    Balance {
        id,
        date: date.to_string(),
        balance: Decimal::try_from(amount).unwrap(),
    }
}

pub(crate) fn delta_metrics(from: &str, to: &str) -> DeltaMetrics {
    DeltaMetrics {
        range: MonthRange {
            from: from.to_string(),
            to: to.to_string(),
        },
        items: vec![
            MonthlyDelta {
                month: from.to_string(),
                balance: Decimal::from(1000),
                delta: None,
            },
            MonthlyDelta {
                month: to.to_string(),
                balance: Decimal::from(1250),
                delta: Some(Decimal::from(250)),
            },
        ],
        missing_months: Vec::new(),
    }
}

pub(crate) fn summary(from: &str, to: &str) -> MetricsSummary {
    MetricsSummary {
        range: MonthRange {
            from: from.to_string(),
            to: to.to_string(),
        },
        start_balance: Some(Decimal::from(1000)),
        end_balance: Some(Decimal::from(1250)),
        total_change: Some(Decimal::from(250)),
        avg_monthly_change: Some(Decimal::from(125)),
        last_month_delta: Some(Decimal::from(-50)),
        positive_months: 1,
        negative_months: 1,
    }
}

#[derive(Default)]
pub(crate) struct FakeBalances {
    pub(crate) list: Script<Vec<Balance>>,
    pub(crate) create: Script<Balance>,
    pub(crate) delete: Script<()>,
    pub(crate) created: Mutex<Vec<CreateBalanceRequest>>,
    pub(crate) deleted: Mutex<Vec<i64>>,
}

#[async_trait]
impl BalanceService for FakeBalances {
    async fn list(&self) -> Result<Vec<Balance>> {
        self.list.next().await
    }

    async fn create(&self, request: CreateBalanceRequest) -> Result<Balance> {
        self.created.lock().unwrap().push(request);
        self.create.next().await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.deleted.lock().unwrap().push(id);
        self.delete.next().await
    }
}

#[derive(Default)]
pub(crate) struct FakeMetrics {
    pub(crate) current: Script<CurrentMonthMetrics>,
    pub(crate) delta: Script<DeltaMetrics>,
    pub(crate) summary: Script<MetricsSummary>,
    pub(crate) ranges: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MetricsService for FakeMetrics {
    async fn current_month(&self) -> Result<CurrentMonthMetrics> {
        self.current.next().await
    }

    async fn delta(&self, start: &str, end: &str) -> Result<DeltaMetrics> {
        self.ranges
            .lock()
            .unwrap()
            .push((start.to_string(), end.to_string()));
        self.delta.next().await
    }

    async fn summary(&self, _start: &str, _end: &str) -> Result<MetricsSummary> {
        self.summary.next().await
    }
}

#[derive(Default)]
pub(crate) struct FakeChat {
    pub(crate) replies: Script<ChatResponse>,
    pub(crate) requests: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl ChatService for FakeChat {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.replies.next().await
    }
}

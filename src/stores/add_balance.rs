//! Add-balance form state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;

use super::Route;
use crate::api::BalanceService;
use crate::error::{DomainError, ValidationError};
use crate::models::{Balance, CreateBalanceRequest};
use crate::reactive::Signal;

/// Banner shown when creation fails, whatever the server said.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create balance. Please try again.";

/// Form fields that carry validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceField {
    Date,
    Balance,
}

/// What a call to [`AddBalanceStore::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A create call was already in flight; nothing happened.
    Ignored,
    /// Validation failed; no request was sent.
    Invalid(Vec<ValidationError>),
    /// The server accepted the balance.
    Created(Balance),
    /// The server rejected or could not be reached.
    Failed(DomainError),
}

/// State for the add-balance form.
///
/// Inputs are kept as the raw strings the user typed so a failed submit
/// leaves them untouched.
pub struct AddBalanceStore {
    service: Arc<dyn BalanceService>,
    date: Signal<String>,
    balance: Signal<String>,
    submitting: Signal<bool>,
    in_flight: AtomicBool,
    error: Signal<Option<String>>,
    failure: Signal<Option<DomainError>>,
    validation: Signal<Vec<ValidationError>>,
    navigation: Signal<Option<Route>>,
}

impl AddBalanceStore {
    pub fn new(service: Arc<dyn BalanceService>) -> Self {
        Self {
            service,
            date: Signal::default(),
            balance: Signal::default(),
            submitting: Signal::new(false),
            in_flight: AtomicBool::new(false),
            error: Signal::new(None),
            failure: Signal::new(None),
            validation: Signal::default(),
            navigation: Signal::new(None),
        }
    }

    pub fn date(&self) -> &Signal<String> {
        &self.date
    }

    pub fn balance(&self) -> &Signal<String> {
        &self.balance
    }

    pub fn submitting(&self) -> &Signal<bool> {
        &self.submitting
    }

    /// Generic banner text after a failed create.
    pub fn error(&self) -> &Signal<Option<String>> {
        &self.error
    }

    /// The precise error behind the banner (status, server wording).
    pub fn failure(&self) -> &Signal<Option<DomainError>> {
        &self.failure
    }

    /// Validation errors from the last submit attempt.
    pub fn validation(&self) -> &Signal<Vec<ValidationError>> {
        &self.validation
    }

    /// Where the shell should go next, if anywhere.
    pub fn navigation(&self) -> &Signal<Option<Route>> {
        &self.navigation
    }

    pub fn set_date(&self, date: impl Into<String>) {
        self.date.set(date.into());
    }

    pub fn set_balance(&self, balance: impl Into<String>) {
        self.balance.set(balance.into());
    }

    /// Validation message for one field, if it is currently invalid.
    pub fn field_error(&self, field: BalanceField) -> Option<ValidationError> {
        match field {
            BalanceField::Date => validate_date(&self.date.get()).err(),
            BalanceField::Balance => parse_balance(&self.balance.get()).err(),
        }
    }

    /// Check every field and build the request.
    pub fn validate(&self) -> Result<CreateBalanceRequest, Vec<ValidationError>> {
        let date = validate_date(&self.date.get());
        let balance = parse_balance(&self.balance.get());
        match (date, balance) {
            (Ok(date), Ok(balance)) => Ok(CreateBalanceRequest { date, balance }),
            (date, balance) => Err([date.err(), balance.err()].into_iter().flatten().collect()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate and send the form.
    ///
    /// Repeated calls while a create is in flight are no-ops. Dropping the
    /// returned future mid-flight releases the form for the next submit.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(submission) = Submission::begin(self) else {
            return SubmitOutcome::Ignored;
        };

        let request = match self.validate() {
            Ok(request) => request,
            Err(errors) => {
                self.validation.set(errors.clone());
                return SubmitOutcome::Invalid(errors);
            }
        };

        self.validation.set(Vec::new());
        self.submitting.set(true);
        self.error.set(None);
        self.failure.set(None);

        let result = self.service.create(request).await;
        drop(submission);

        match result {
            Ok(created) => {
                tracing::info!(name: "balances.create.ok", id = created.id, date = %created.date, "balance created");
                self.navigation.set(Some(Route::Balances));
                SubmitOutcome::Created(created)
            }
            Err(err) => {
                tracing::error!(name: "balances.create.failed", error = %err, status = ?err.status, "Error creating balance");
                self.error.set(Some(CREATE_FAILED_MESSAGE.to_string()));
                self.failure.set(Some(err.clone()));
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Leave the form without saving.
    pub fn cancel(&self) {
        self.navigation.set(Some(Route::Balances));
    }
}

impl fmt::Debug for AddBalanceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddBalanceStore")
            .field("date", &self.date)
            .field("balance", &self.balance)
            .field("submitting", &self.submitting)
            .field("error", &self.error)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

/// Exclusive claim on the form while one submit runs.
struct Submission<'a> {
    store: &'a AddBalanceStore,
}

impl<'a> Submission<'a> {
    fn begin(store: &'a AddBalanceStore) -> Option<Self> {
        store
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { store })
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if self.store.submitting.get() {
            self.store.submitting.set(false);
        }
        self.store.in_flight.store(false, Ordering::Release);
    }
}

fn validate_date(raw: &str) -> Result<String, ValidationError> {
    let date = raw.trim();
    if date.is_empty() {
        return Err(ValidationError::Required("Date"));
    }
    Ok(date.to_string())
}

fn parse_balance(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required("Balance"));
    }
    let value = Decimal::from_str(raw)
        .ok()
        .ok_or(ValidationError::NotANumber("Balance"))?;
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative("Balance"));
    }
    Ok(value)
}

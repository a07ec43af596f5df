//! HR self-service: payroll slips and the commission dashboard.
//!
//! Payroll slips are sensitive, so the viewer asks for a biometric check
//! before fetching them. Devices without usable biometrics skip the check.

use farmacia_client::api::Payroll;
use farmacia_client::{ApiClient, ApiError, BiometricAuthenticator, BiometricGate};
use farmacia_core::{EmployeeId, Price};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Prompt shown by the OS biometric dialog.
pub const PAYROLL_PROMPT: &str = "Confirma tu identidad para ver liquidaciones";
/// Alert title when the biometric check fails.
pub const ACCESS_DENIED_TITLE: &str = "Acceso Denegado";
/// Alert body when the platform gave no reason.
pub const ACCESS_DENIED_MESSAGE: &str = "No se pudo verificar tu identidad";

#[derive(Debug, Error)]
pub enum PayrollError {
    /// Biometric check failed; carries the alert body.
    #[error("{0}")]
    Denied(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Viewer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayrollState {
    /// Waiting for a successful check. `reason` is the last failure.
    Locked { reason: Option<String> },
    Unlocked { payrolls: Vec<Payroll> },
}

/// Biometric-gated payroll list.
#[derive(Debug)]
pub struct PayrollViewer<A> {
    gate: BiometricGate<A>,
    api: ApiClient,
    employee_id: Option<EmployeeId>,
    state: PayrollState,
}

impl<A: BiometricAuthenticator> PayrollViewer<A> {
    pub const fn new(gate: BiometricGate<A>, api: ApiClient, employee_id: Option<EmployeeId>) -> Self {
        Self {
            gate,
            api,
            employee_id,
            state: PayrollState::Locked { reason: None },
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PayrollState {
        &self.state
    }

    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self.state, PayrollState::Unlocked { .. })
    }

    /// Loaded slips; empty while locked.
    #[must_use]
    pub fn payrolls(&self) -> &[Payroll] {
        match &self.state {
            PayrollState::Unlocked { payrolls } => payrolls,
            PayrollState::Locked { .. } => &[],
        }
    }

    /// Run the biometric check and load the slips.
    ///
    /// Called on screen entry and from the retry button.
    ///
    /// # Errors
    ///
    /// Returns `PayrollError::Denied` with the alert body when the check
    /// fails, or `PayrollError::Api` when loading fails. The viewer stays
    /// locked in both cases.
    #[instrument(skip(self), fields(employee_id = ?self.employee_id))]
    pub async fn unlock(&mut self) -> Result<&[Payroll], PayrollError> {
        if self.gate.is_available().await {
            let outcome = self.gate.authenticate(Some(PAYROLL_PROMPT)).await;
            if let Some(reason) = outcome.reason() {
                let message = if reason.trim().is_empty() {
                    ACCESS_DENIED_MESSAGE.to_string()
                } else {
                    reason.to_string()
                };
                warn!(reason = %message, "Payroll access denied");
                self.state = PayrollState::Locked {
                    reason: Some(message.clone()),
                };
                return Err(PayrollError::Denied(message));
            }
        } else {
            info!("Biometrics unavailable, loading payrolls without check");
        }

        let payrolls = self.api.payrolls(self.employee_id).await?;
        info!(count = payrolls.len(), "Payrolls loaded");
        self.state = PayrollState::Unlocked { payrolls };
        Ok(self.payrolls())
    }

    /// Lock again, e.g. when leaving the screen.
    pub fn lock(&mut self) {
        self.state = PayrollState::Locked { reason: None };
    }
}

/// Default commission rate on monthly sales.
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// Seller's monthly sales summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionDashboard {
    pub sales_this_month: Decimal,
    pub sales_target: Decimal,
    pub commission_rate: Decimal,
}

impl CommissionDashboard {
    #[must_use]
    pub const fn new(sales_this_month: Decimal, sales_target: Decimal) -> Self {
        Self {
            sales_this_month,
            sales_target,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }

    /// Progress toward the target in percent, capped at 100.
    ///
    /// A non-positive target reports 0. A ratio too large for `Decimal` is
    /// capped like any other overshoot.
    #[must_use]
    pub fn progress_percent(&self) -> Decimal {
        if self.sales_target <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let overflow = if self.sales_this_month.is_sign_negative() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        };
        self.sales_this_month
            .checked_div(self.sales_target)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(overflow)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    /// Commission on this month's sales, in whole pesos.
    #[must_use]
    pub fn estimated_commission(&self) -> Decimal {
        self.sales_this_month
            .checked_mul(self.commission_rate)
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// e.g. `82% de meta`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        let percent = self
            .progress_percent()
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("{percent}% de meta")
    }

    #[must_use]
    pub fn commission_label(&self) -> String {
        Price::clp(self.estimated_commission()).display()
    }
}

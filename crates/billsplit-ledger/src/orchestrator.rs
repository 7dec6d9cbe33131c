//! # Reconciliation Orchestrator
//!
//! Runs one bill through every reconciliation step and submits the result.
//!
//! ## Stages
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Received ──► Aggregated ──► Resolved ──► Validated ──► Built ──►      │
//! │     │             │              │            │            │            │
//! │     │       per-person      group id +     plan vs     Expense          │
//! │     │       totals          roster +       declared    Request          │
//! │     │       (itemized)      split plan     total                        │
//! │     │                                                                   │
//! │     └─── any stage fails ──► ReconcileFailure { stage, error }          │
//! │                                                                         │
//! │  ──► Submitted: LedgerClient::create_expense ──► ReconcileOutcome       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One pass per bill. Nothing is retried and nothing is rolled back, so
//! resubmitting a bill after an ambiguous ledger failure can record the
//! expense twice. The [`ExpenseRequest::fingerprint`] logged with every
//! submission identifies such duplicates.

use std::fmt;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use billsplit_core::plan::{equal_plan, itemized_plan};
use billsplit_core::validation::reconciles;
use billsplit_core::{
    aggregate, Aggregation, BillSubmission, CoreError, DescriptionSource, ExpensePayloadBuilder,
    ExpenseRequest, GroupId, GroupMembership, GroupRef, LedgerCapabilities, MemberId,
    MemberPolicy, Money, PayloadInput, SplitMode, SplitPlan, SplitValidator,
};

use crate::error::LedgerError;
use crate::ports::{LedgerAck, LedgerClient};
use crate::resolver::MemberResolver;

// =============================================================================
// Stages and Results
// =============================================================================

/// Reconciliation progress, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStage {
    Received,
    Aggregated,
    Resolved,
    Validated,
    Built,
    Submitted,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileStage::Received => "received",
            ReconcileStage::Aggregated => "aggregated",
            ReconcileStage::Resolved => "resolved",
            ReconcileStage::Validated => "validated",
            ReconcileStage::Built => "built",
            ReconcileStage::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// A reconciliation that stopped early.
///
/// `stage` is the step that failed; the message is the cause's.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReconcileFailure {
    pub stage: ReconcileStage,
    #[source]
    pub error: LedgerError,
}

impl ReconcileFailure {
    fn at(stage: ReconcileStage) -> impl FnOnce(LedgerError) -> ReconcileFailure {
        move |error| ReconcileFailure { stage, error }
    }

    fn core(stage: ReconcileStage) -> impl FnOnce(CoreError) -> ReconcileFailure {
        move |error| ReconcileFailure {
            stage,
            error: error.into(),
        }
    }
}

/// An expense ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExpense {
    pub request: ExpenseRequest,
    pub fingerprint: Uuid,
    pub membership: GroupMembership,
}

/// A submitted expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub request_id: Uuid,
    pub fingerprint: Uuid,
    pub request: ExpenseRequest,
    pub ack: LedgerAck,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// What a split plan is built from.
enum SplitBasis {
    Itemized(Aggregation),
    Equal { each_share: Option<Money> },
}

/// Sequences aggregation, resolution, validation, payload construction and
/// submission.
#[derive(Clone)]
pub struct ReconciliationOrchestrator {
    resolver: MemberResolver,
    ledger: Arc<dyn LedgerClient>,
    builder: ExpensePayloadBuilder,
    validator: SplitValidator,
    policy: MemberPolicy,
}

impl fmt::Debug for ReconciliationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationOrchestrator")
            .field("resolver", &self.resolver)
            .field("builder", &self.builder)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReconciliationOrchestrator {
    pub fn new(
        resolver: MemberResolver,
        ledger: Arc<dyn LedgerClient>,
        capabilities: LedgerCapabilities,
        policy: MemberPolicy,
    ) -> Self {
        ReconciliationOrchestrator {
            resolver,
            ledger,
            builder: ExpensePayloadBuilder::new(capabilities),
            validator: SplitValidator::new(),
            policy,
        }
    }

    pub fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }

    pub fn policy(&self) -> MemberPolicy {
        self.policy
    }

    /// Reconciles and submits one bill.
    pub async fn reconcile(
        &self,
        submission: &BillSubmission,
    ) -> Result<ReconcileOutcome, ReconcileFailure> {
        let request_id = Uuid::new_v4();
        let span = info_span!("reconcile", %request_id);

        async move {
            let prepared = self.prepare_inner(submission).await?;

            info!(
                stage = %ReconcileStage::Submitted,
                group_id = prepared.request.group_id,
                cost = %prepared.request.cost,
                fingerprint = %prepared.fingerprint,
                "Submitting expense"
            );

            let ack = self
                .ledger
                .create_expense(&prepared.request)
                .await
                .map_err(|error| {
                    warn!(error = %error, fingerprint = %prepared.fingerprint, "Ledger submission failed");
                    ReconcileFailure {
                        stage: ReconcileStage::Submitted,
                        error,
                    }
                })?;

            info!(expense_ids = ?ack.expense_ids, "Expense recorded");

            Ok(ReconcileOutcome {
                request_id,
                fingerprint: prepared.fingerprint,
                request: prepared.request,
                ack,
            })
        }
        .instrument(span)
        .await
    }

    /// Runs every stage up to `Built` without submitting.
    pub async fn prepare(
        &self,
        submission: &BillSubmission,
    ) -> Result<PreparedExpense, ReconcileFailure> {
        let span = info_span!("reconcile", request_id = %Uuid::new_v4(), dry_run = true);
        self.prepare_inner(submission).instrument(span).await
    }

    async fn prepare_inner(
        &self,
        submission: &BillSubmission,
    ) -> Result<PreparedExpense, ReconcileFailure> {
        debug!(
            stage = %ReconcileStage::Received,
            item_count = submission.items.len(),
            "Bill received"
        );

        // Aggregated
        let basis = match submission.mode {
            SplitMode::Itemized => {
                let aggregation = aggregate(&submission.items)
                    .map_err(ReconcileFailure::core(ReconcileStage::Aggregated))?;
                debug!(
                    stage = %ReconcileStage::Aggregated,
                    person_count = aggregation.len(),
                    "Items aggregated"
                );
                SplitBasis::Itemized(aggregation)
            }
            SplitMode::Equal { each_share } => SplitBasis::Equal { each_share },
        };

        // Resolved
        let (group_id, group_name) = self
            .resolve_group(&submission.group)
            .await
            .map_err(ReconcileFailure::at(ReconcileStage::Resolved))?;
        let membership = self
            .resolver
            .resolve_members(group_id, &group_name)
            .await
            .map_err(ReconcileFailure::at(ReconcileStage::Resolved))?;

        let (plan, declared_total) = self
            .plan(submission, &basis, &membership)
            .map_err(ReconcileFailure::core(ReconcileStage::Resolved))?;
        let payer = self
            .payer(submission, &membership)
            .map_err(ReconcileFailure::core(ReconcileStage::Resolved))?;

        debug!(
            stage = %ReconcileStage::Resolved,
            group_id,
            member_count = membership.member_count(),
            "Group resolved"
        );

        // Validated
        self.validator
            .validate(declared_total, &plan)
            .map_err(|e| {
                warn!(stage = %ReconcileStage::Validated, error = %e, "Split does not reconcile");
                ReconcileFailure::core(ReconcileStage::Validated)(e)
            })?;

        // Built
        let source = match &basis {
            SplitBasis::Itemized(aggregation) => DescriptionSource::Aggregation(aggregation),
            SplitBasis::Equal { .. } => DescriptionSource::Bill(&submission.items),
        };
        let date = submission.date.unwrap_or_else(|| Local::now().date_naive());
        let request = self
            .builder
            .build(PayloadInput {
                plan: &plan,
                source,
                declared_total,
                group_id,
                date,
                payer,
            })
            .map_err(ReconcileFailure::core(ReconcileStage::Built))?;

        let fingerprint = request.fingerprint();
        debug!(
            stage = %ReconcileStage::Built,
            split_equally = request.split_equally,
            fingerprint = %fingerprint,
            "Expense request built"
        );

        Ok(PreparedExpense {
            request,
            fingerprint,
            membership,
        })
    }

    async fn resolve_group(&self, group: &GroupRef) -> Result<(GroupId, String), LedgerError> {
        match group {
            GroupRef::Id(id) => Ok((*id, String::new())),
            GroupRef::Name(name) => {
                let id = self.resolver.resolve_group(name).await?;
                Ok((id, name.clone()))
            }
        }
    }

    /// Builds the split plan and picks the total it must reconcile with.
    fn plan(
        &self,
        submission: &BillSubmission,
        basis: &SplitBasis,
        membership: &GroupMembership,
    ) -> Result<(SplitPlan, Money), CoreError> {
        match basis {
            SplitBasis::Itemized(aggregation) => {
                let declared_total = match submission.declared_total {
                    Some(total) => total,
                    None => aggregation.grand_total()?,
                };
                let plan = itemized_plan(aggregation, membership, self.policy)?;
                Ok((plan, declared_total))
            }
            SplitBasis::Equal { each_share } => {
                let items_total = submission.items_total()?;
                let declared_total = submission.declared_total.unwrap_or(items_total);
                if !reconciles(items_total, declared_total) {
                    warn!(
                        items_total = %items_total,
                        declared_total = %declared_total,
                        "Item prices do not add up to the declared total; using the declared total"
                    );
                }
                let plan = equal_plan(*each_share, declared_total, membership)?;
                Ok((plan, declared_total))
            }
        }
    }

    /// Resolves `paid_by` to a member id.
    ///
    /// Under [`MemberPolicy::Sentinel`] an unknown payer is dropped.
    fn payer(
        &self,
        submission: &BillSubmission,
        membership: &GroupMembership,
    ) -> Result<Option<MemberId>, CoreError> {
        let Some(name) = submission.paid_by.as_deref() else {
            return Ok(None);
        };

        match (self.resolver.find_member_id(name, membership), self.policy) {
            (Some(id), _) => Ok(Some(id)),
            (None, MemberPolicy::Strict) => Err(CoreError::UnresolvedMember {
                name: name.to_string(),
            }),
            (None, MemberPolicy::Sentinel) => {
                warn!(paid_by = %name, "Payer is not a group member; ignoring");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Quotation workflow: validate, store a draft, shop rates, attach them.

use std::fmt;
use std::sync::Arc;

use futures::TryStreamExt;
use tracing::{info, instrument, warn};

use crate::carrier::{CarrierGateway, RateQuery};
use crate::domain::{Quotation, QuotationId, QuotationStatus, RateOffer};
use crate::store::{QuotationStore, UpdateOutcome};

use super::CarrierAccount;
use super::error::WorkflowError;
use super::input::QuoteInput;

/// How far a rate request got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotationStage {
    Validating,
    DraftPersisted,
    RatesFetched,
    RatesPersisted,
    Done,
}

impl fmt::Display for QuotationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuotationStage::Validating => "validating",
            QuotationStage::DraftPersisted => "draft persisted",
            QuotationStage::RatesFetched => "rates fetched",
            QuotationStage::RatesPersisted => "rates persisted",
            QuotationStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed rate request.
///
/// `stage` is the last stage reached before the failure. From
/// `DraftPersisted` on, `quotation_id` names the draft left behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} (after stage: {stage})")]
pub struct QuotationFailure {
    pub stage: QuotationStage,
    pub quotation_id: Option<QuotationId>,
    #[source]
    pub error: WorkflowError,
}

/// A successful rate request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteOutcome {
    pub quotation_id: QuotationId,
    pub rates: Vec<RateOffer>,
}

/// Drives quotations from request to rated document.
pub struct QuotationWorkflow {
    gateway: Arc<dyn CarrierGateway>,
    store: Arc<dyn QuotationStore>,
    account: CarrierAccount,
}

impl QuotationWorkflow {
    pub fn new(
        gateway: Arc<dyn CarrierGateway>,
        store: Arc<dyn QuotationStore>,
        account: CarrierAccount,
    ) -> Self {
        Self {
            gateway,
            store,
            account,
        }
    }

    /// Validate the request, persist a draft, shop rates and attach them.
    ///
    /// A draft whose rate fetch fails is left in the store.
    #[instrument(skip_all, fields(quotation_id = tracing::field::Empty))]
    pub async fn request_rates(&self, input: QuoteInput) -> Result<QuoteOutcome, QuotationFailure> {
        let mut stage = QuotationStage::Validating;
        let fail = |stage, quotation_id, error| QuotationFailure {
            stage,
            quotation_id,
            error,
        };

        let request = input
            .validate()
            .map_err(|e| fail(stage, None, WorkflowError::from(e)))?;

        let draft = Quotation::draft(&request);
        let id = self.store.insert_draft(&draft).await.map_err(|e| {
            fail(
                stage,
                None,
                WorkflowError::store("storing draft quotation", e),
            )
        })?;
        stage = QuotationStage::DraftPersisted;
        tracing::Span::current().record("quotation_id", tracing::field::display(id));

        let query = RateQuery {
            shipper: self.account.shipper.clone(),
            ship_from: request.ship_from().clone(),
            ship_to: request.ship_to().clone(),
            packages: request.packages().to_vec(),
            pickup_date: request.pickup_date(),
            pickup_time: request.pickup_time(),
            piece_count: request.package_count(),
        };

        let rates = self
            .fetch_rates(&query)
            .await
            .map_err(|e| fail(stage, Some(id), e))?;
        stage = QuotationStage::RatesFetched;
        let count = rates.len();

        match self.store.attach_rates(id, rates.clone()).await {
            Ok(UpdateOutcome::Updated | UpdateOutcome::Unchanged) => {}
            Ok(UpdateOutcome::NoMatch) => {
                return Err(fail(
                    stage,
                    Some(id),
                    WorkflowError::Persistence(format!(
                        "quotation {id} disappeared before rates were attached"
                    )),
                ));
            }
            Err(e) => {
                return Err(fail(
                    stage,
                    Some(id),
                    WorkflowError::store("attaching rates", e),
                ));
            }
        }

        info!(rates = count, stage = %QuotationStage::Done, "quotation rated");

        Ok(QuoteOutcome {
            quotation_id: id,
            rates,
        })
    }

    async fn fetch_rates(&self, query: &RateQuery) -> Result<Vec<RateOffer>, WorkflowError> {
        let token = self
            .gateway
            .authenticate(&self.account.credentials)
            .await
            .map_err(WorkflowError::carrier)?;

        let rates = self
            .gateway
            .fetch_rates(&token, query)
            .await
            .map_err(WorkflowError::carrier)?;

        if rates.is_empty() {
            warn!("carrier returned no usable rates");
            return Err(WorkflowError::RateFetch(
                "carrier returned no usable rates".into(),
            ));
        }
        Ok(rates)
    }

    /// Mark a quotation saved. Saving twice is fine.
    #[instrument(skip(self))]
    pub async fn save(&self, id: QuotationId) -> Result<Quotation, WorkflowError> {
        let outcome = self
            .store
            .mark_saved(id)
            .await
            .map_err(|e| WorkflowError::store("saving quotation", e))?;

        if outcome == UpdateOutcome::NoMatch {
            return Err(WorkflowError::NotFound(format!("quotation {id}")));
        }
        info!(?outcome, "quotation saved");
        self.get(id).await
    }

    pub async fn get(&self, id: QuotationId) -> Result<Quotation, WorkflowError> {
        self.store
            .get(id)
            .await
            .map_err(|e| WorkflowError::store("loading quotation", e))?
            .ok_or_else(|| WorkflowError::NotFound(format!("quotation {id}")))
    }

    /// All saved quotations, oldest first.
    pub async fn saved(&self) -> Result<Vec<Quotation>, WorkflowError> {
        self.store
            .list(Some(QuotationStatus::Saved))
            .try_collect()
            .await
            .map_err(|e| WorkflowError::store("listing quotations", e))
    }
}

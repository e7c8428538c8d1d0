//! Pagination controller
//!
//! The request -> classify -> advance -> decide loop for one resource.

use super::transport::Transport;
use super::types::{PageOutcome, PaginationSpec, ResourceDescriptor};
use crate::decode::{Classification, ResponseClassifier, TimestampNormalizer};
use crate::error::{Error, Result};
use crate::facet::{DateWindowFilter, WindowMatch};
use crate::pagination::{
    Advance, DateCursorPaginator, FacetPaginator, LatestFacetPaginator, NextUrlPaginator, NoPaginator,
    PageRequest, Paginator, StopReason,
};
use crate::request::RequestTarget;
use crate::state::{CursorTracker, PaginationState};
use crate::types::JsonValue;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

/// Drives one resource's traversal.
///
/// Construction validates the descriptor, so configuration problems surface
/// before any request is issued. Each [`step`](Self::step) consumes the
/// current [`PaginationState`] and returns the next one together with a
/// [`PageOutcome`]. Requests are strictly sequential.
pub struct PaginationController<T> {
    descriptor: ResourceDescriptor,
    transport: T,
    paginator: Box<dyn Paginator>,
    classifier: ResponseClassifier,
    base: RequestTarget,
    tracker: Option<CursorTracker>,
    normalizers: Vec<TimestampNormalizer>,
    window_match: WindowMatch,
}

impl<T: Transport> PaginationController<T> {
    /// Validate `descriptor` and prepare the traversal
    pub fn new(descriptor: ResourceDescriptor, transport: T) -> Result<Self> {
        validate(&descriptor)?;

        let mut classifier = ResponseClassifier::new(&descriptor.selector_path)?;
        if let Some(max) = descriptor.max_page_size {
            classifier = classifier.with_max_page_size(max);
        }

        let (paginator, window_match) = build_paginator(&descriptor)?;

        let mut params = descriptor.static_params.clone();
        if let (Some(param), Some(max)) = (&descriptor.page_size_param, descriptor.max_page_size) {
            params.insert(param.clone(), max.to_string());
        }
        let base = RequestTarget::for_endpoint(
            &descriptor.base_url,
            &descriptor.endpoint_path,
            params,
        );

        let tracker = descriptor.cursor.as_ref().map(CursorTracker::new);
        let normalizers = descriptor
            .timestamp_fields
            .iter()
            .map(TimestampNormalizer::new)
            .collect();

        Ok(Self {
            descriptor,
            transport,
            paginator,
            classifier,
            base,
            tracker,
            normalizers,
            window_match,
        })
    }

    /// Seed the cursor from a value recorded by an earlier run
    #[must_use]
    pub fn resume_from(mut self, last_value: Option<&str>) -> Self {
        if let Some(cursor) = &self.descriptor.cursor {
            self.tracker = Some(CursorTracker::resume_from(cursor, last_value));
        }
        self
    }

    /// The resource being harvested
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Name of the pagination strategy in use
    pub fn strategy(&self) -> &'static str {
        self.paginator.name()
    }

    /// How the date window applied to the facet space
    pub fn window_match(&self) -> WindowMatch {
        self.window_match
    }

    /// Incremental cursor, if the resource declares one
    pub fn tracker(&self) -> Option<&CursorTracker> {
        self.tracker.as_ref()
    }

    /// State before the first request
    pub fn initial_state(&self) -> PaginationState {
        self.paginator.initial_state()
    }

    /// The request the controller would issue for `state`
    pub fn request_for(&self, state: &PaginationState) -> Result<Option<RequestTarget>> {
        let Some(request) = self.paginator.request(state) else {
            return Ok(None);
        };
        let target = match request {
            PageRequest::Params(params) => self.base.clone().inject(&params)?,
            PageRequest::Url(url) => {
                RequestTarget::raw(url).inject(&self.descriptor.static_params)?
            }
        };
        Ok(Some(target))
    }

    /// Issue the request for `state` and decide what follows
    pub async fn step(&mut self, state: PaginationState) -> Result<(PaginationState, PageOutcome)> {
        if state.is_exhausted() {
            return Ok((state, PageOutcome::Terminate(Vec::new(), StopReason::Finished)));
        }
        let Some(target) = self.request_for(&state)? else {
            return Ok((state.exhausted(), PageOutcome::Terminate(Vec::new(), StopReason::Finished)));
        };

        let fetching = state.fetching();
        debug!(resource = %self.descriptor.name, page = fetching.pages + 1, url = %target, "Fetching page");
        let body = self.transport.fetch(&target).await?;

        let page = match self.classifier.classify(&body) {
            Classification::Page(page) => page,
            Classification::Malformed(reason) => {
                let reason = StopReason::Malformed(reason);
                warn!(resource = %self.descriptor.name, url = %target, %reason, "Stopping on malformed page");
                return Ok((fetching.exhausted(), PageOutcome::Fail(reason)));
            }
        };

        let counted = fetching.with_page(page.len());
        let advance = self.paginator.advance(&counted, &page);
        let fetched = page.len();
        let records = self.admit(page.records);
        debug!(
            resource = %self.descriptor.name,
            fetched,
            emitted = records.len(),
            full = page.full,
            "Page classified"
        );

        Ok(match advance {
            Advance::Next(next) => (next, PageOutcome::Continue(records)),
            Advance::Done(done, reason) => {
                if reason.is_warning() {
                    warn!(resource = %self.descriptor.name, %reason, "Pagination stopped early");
                } else {
                    info!(resource = %self.descriptor.name, pages = done.pages, %reason, "Pagination complete");
                }
                (done, PageOutcome::Terminate(records, reason))
            }
        })
    }

    /// Lazily fetch pages until the traversal ends or a transport error occurs
    pub fn pages(&mut self) -> impl Stream<Item = Result<PageOutcome>> + Send + '_ {
        let state = self.initial_state();
        stream::unfold(Some((self, state)), |acc| async move {
            let (controller, state) = acc?;
            if state.is_exhausted() {
                return None;
            }
            match controller.step(state).await {
                Ok((next, outcome)) => Some((Ok(outcome), Some((controller, next)))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Lazily produce the harvested records
    pub fn records(&mut self) -> impl Stream<Item = Result<JsonValue>> + Send + '_ {
        self.pages().flat_map(|outcome| {
            let items: Vec<Result<JsonValue>> = match outcome {
                Ok(outcome) => outcome.into_records().into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
    }

    /// Normalise records and drop those the cursor has already seen
    fn admit(&mut self, records: Vec<JsonValue>) -> Vec<JsonValue> {
        records
            .into_iter()
            .map(|mut record| {
                for normalizer in &self.normalizers {
                    normalizer.apply(&mut record);
                }
                record
            })
            .filter(|record| {
                self.tracker
                    .as_mut()
                    .map_or(true, |tracker| tracker.observe(record).should_emit())
            })
            .collect()
    }
}

impl<T> std::fmt::Debug for PaginationController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationController")
            .field("resource", &self.descriptor.name)
            .field("paginator", &self.paginator)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

fn validate(descriptor: &ResourceDescriptor) -> Result<()> {
    if descriptor.name.trim().is_empty() {
        return Err(Error::missing_field("name"));
    }
    if descriptor.selector_path.trim().is_empty() {
        return Err(Error::missing_field(format!(
            "{}.selector",
            descriptor.name
        )));
    }
    if descriptor.max_page_size == Some(0) {
        return Err(Error::invalid_value(
            format!("{}.max_page_size", descriptor.name),
            "must be greater than zero",
        ));
    }

    let endpoint = crate::request::join_url(&descriptor.base_url, &descriptor.endpoint_path);
    if let Err(e) = Url::parse(&endpoint) {
        return Err(Error::invalid_value(
            format!("{}.base_url", descriptor.name),
            format!("'{endpoint}': {e}"),
        ));
    }

    if let Some(cursor) = &descriptor.cursor {
        if cursor.path.trim().is_empty() {
            return Err(Error::missing_field(format!("{}.cursor.path", descriptor.name)));
        }
    }
    Ok(())
}

fn build_paginator(descriptor: &ResourceDescriptor) -> Result<(Box<dyn Paginator>, WindowMatch)> {
    let paginator: Box<dyn Paginator> = match &descriptor.pagination {
        PaginationSpec::None => Box::new(NoPaginator),
        PaginationSpec::NextUrl { path } => Box::new(NextUrlPaginator::new(path.clone())),
        PaginationSpec::Facets { space } => {
            let (space, matched) =
                DateWindowFilter::filter_with_match(space, &descriptor.date_window);
            debug!(
                resource = %descriptor.name,
                combinations = space.len(),
                ?matched,
                "Facet space ready"
            );
            return Ok((Box::new(FacetPaginator::new(space)), matched));
        }
        PaginationSpec::LatestFacet {
            outer,
            inner,
            reference,
            facet_field,
        } => {
            let mut paginator = LatestFacetPaginator::from_reference(outer, inner.clone(), *reference)?;
            if let Some(field) = facet_field {
                paginator = paginator.with_facet_field(field.clone());
            }
            Box::new(paginator)
        }
        PaginationSpec::DateCursor { param, field } => {
            let max = descriptor.max_page_size.ok_or_else(|| {
                Error::missing_field(format!("{}.max_page_size", descriptor.name))
            })?;
            Box::new(DateCursorPaginator::new(param.clone(), field.clone(), max))
        }
    };
    Ok((paginator, WindowMatch::Unfiltered))
}

use deck_events::ProgressEvent;
use deck_model::Slide;
use deck_reconcile::{Action, Plan};
use deck_remote::{RemoteAdapter, RemoteError};
use thiserror::Error;

use crate::sink::ProgressSink;

#[derive(Debug, Error)]
#[error("action {index} ({summary}) failed: {source}")]
pub struct ApplyError {
    pub index: usize,
    pub summary: String,
    #[source]
    pub source: RemoteError,
}

/// Walks a plan end to end, invoking `adapter` once per action and emitting
/// a [`ProgressEvent`] per action on `sink`. Stops at the first adapter
/// error and surfaces it with the failing action's identity; there is no
/// rollback of actions already applied.
///
/// An `Update` whose slide carries `freeze: true` is never dispatched — the
/// reconciliation engine still plans whatever move the slide's position
/// requires, but its content is never republished.
pub async fn apply_plan(
    adapter: &mut dyn RemoteAdapter,
    plan: &Plan,
    sink: &dyn ProgressSink,
) -> Result<usize, ApplyError> {
    sink.emit(ProgressEvent::Started { total: plan.len() });
    let mut applied = 0;

    for (index, action) in plan.iter().enumerate() {
        if let Action::Update { slide, .. } = action {
            if slide.freeze {
                sink.emit(ProgressEvent::ActionApplied {
                    index,
                    total: plan.len(),
                    summary: "skipped update because freeze:true".to_string(),
                });
                continue;
            }
        }

        let summary = summarize(action);
        if let Err(source) = dispatch(adapter, action).await {
            sink.emit(ProgressEvent::Failed {
                index,
                summary: summary.clone(),
                error: source.to_string(),
            });
            return Err(ApplyError {
                index,
                summary,
                source,
            });
        }

        applied += 1;
        sink.emit(ProgressEvent::ActionApplied {
            index,
            total: plan.len(),
            summary,
        });
    }

    sink.emit(ProgressEvent::Finished { applied });
    Ok(applied)
}

/// The watch loop's fast path: updates exactly the given 1-indexed pages in
/// place. Never moves, inserts, or deletes — callers that need structural
/// changes go through [`apply_plan`] instead.
pub async fn apply_incremental(
    adapter: &mut dyn RemoteAdapter,
    pages: &[usize],
    slides: &[Slide],
    sink: &dyn ProgressSink,
) -> Result<usize, ApplyError> {
    sink.emit(ProgressEvent::Started { total: pages.len() });
    let mut applied = 0;

    for (step, &page) in pages.iter().enumerate() {
        let position = page - 1;
        let slide = &slides[position];
        if slide.freeze {
            sink.emit(ProgressEvent::ActionApplied {
                index: step,
                total: pages.len(),
                summary: "skipped update because freeze:true".to_string(),
            });
            continue;
        }

        let summary = format!("updated page {page}");
        if let Err(source) = adapter.update(position, slide).await {
            sink.emit(ProgressEvent::Failed {
                index: step,
                summary: summary.clone(),
                error: source.to_string(),
            });
            return Err(ApplyError {
                index: step,
                summary,
                source,
            });
        }

        applied += 1;
        sink.emit(ProgressEvent::ActionApplied {
            index: step,
            total: pages.len(),
            summary,
        });
    }

    sink.emit(ProgressEvent::Finished { applied });
    Ok(applied)
}

async fn dispatch(adapter: &mut dyn RemoteAdapter, action: &Action) -> Result<(), RemoteError> {
    match action {
        Action::Append { slide } => adapter.append(slide).await,
        Action::Insert { slide, at } => adapter.insert(slide, *at).await,
        Action::Update { index, slide } => adapter.update(*index, slide).await,
        Action::Move { from, to } => adapter.move_slide(*from, *to).await,
        Action::Delete { index } => adapter.delete(*index).await,
    }
}

fn summarize(action: &Action) -> String {
    match action {
        Action::Append { .. } => "appended page".to_string(),
        Action::Insert { at, .. } => format!("inserted page at {at}"),
        Action::Update { index, .. } => format!("updated page {index}"),
        Action::Move { from, to } => format!("moved page {from} to {to}"),
        Action::Delete { index } => format!("deleted page {index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_model::{Body, Fragment, Paragraph};
    use deck_reconcile::reconcile;
    use deck_remote::MemoryAdapter;
    use std::sync::Mutex;

    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn titled(title: &str) -> Slide {
        Slide::new("TITLE_AND_BODY").with_titles(vec![Body::new(vec![Paragraph::new(vec![
            Fragment::new(title),
        ])])])
    }

    #[tokio::test]
    async fn applies_every_action_and_converges() {
        let before = vec![titled("A"), titled("B")];
        let after = vec![titled("B"), titled("A"), titled("C")];
        let plan = reconcile(&before, &after);

        let mut adapter = MemoryAdapter::seeded(before, vec![]);
        let sink = RecordingSink::new();
        let applied = apply_plan(&mut adapter, &plan, &sink).await.unwrap();

        assert_eq!(applied, plan.len());
        assert_eq!(adapter.slides(), after.as_slice());
        assert!(matches!(sink.events().first(), Some(ProgressEvent::Started { .. })));
        assert!(matches!(sink.events().last(), Some(ProgressEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn frozen_update_is_skipped_not_dispatched() {
        let before = vec![titled("A")];
        let after = vec![titled("A2").frozen()];
        let plan = reconcile(&before, &after);

        let mut adapter = MemoryAdapter::seeded(before, vec![]);
        let sink = RecordingSink::new();
        apply_plan(&mut adapter, &plan, &sink).await.unwrap();

        // content on the remote is untouched; only the frozen flag differs,
        // which is itself excluded from Slide equality.
        assert_eq!(adapter.slides(), &[titled("A")]);
    }

    #[tokio::test]
    async fn failure_reports_action_identity_and_stops() {
        let mut adapter = MemoryAdapter::new(vec![]);
        let plan: Plan = vec![Action::Delete { index: 0 }];
        let sink = RecordingSink::new();

        let err = apply_plan(&mut adapter, &plan, &sink).await.unwrap_err();
        assert_eq!(err.index, 0);
        assert!(matches!(sink.events().last(), Some(ProgressEvent::Failed { index: 0, .. })));
    }

    #[tokio::test]
    async fn incremental_apply_only_updates_named_pages() {
        let slides = vec![titled("A"), titled("B2"), titled("C")];
        let mut adapter = MemoryAdapter::seeded(
            vec![titled("A"), titled("B"), titled("C")],
            vec![],
        );
        let sink = RecordingSink::new();
        apply_incremental(&mut adapter, &[2], &slides, &sink).await.unwrap();
        assert_eq!(adapter.slides(), slides.as_slice());
    }
}

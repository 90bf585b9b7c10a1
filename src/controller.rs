//! Paginated task list state and the fetch scheduling behind it.
//!
//! Every change to category, page or ordering schedules a fetch after the
//! debounce window. Scheduling a fetch cancels the previous one, whether it is
//! still waiting out the window or already in flight, and a generation counter
//! makes sure only the most recently scheduled fetch can commit to the view.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::TaskGateway;
use crate::error::ApiError;
use crate::models::{OrderBy, Priority, TaskCategory, TaskPage, TaskPatch, TaskRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; the displayed list is whatever was there before.
    Error,
}

#[derive(Debug, Clone)]
pub struct ListView {
    pub category: TaskCategory,
    pub page: u32,
    pub ordering: Option<OrderBy>,
    pub has_next: bool,
    pub has_previous: bool,
    pub order_fields: Vec<&'static str>,
    pub tasks: Vec<TaskRecord>,
    pub phase: LoadPhase,
}

impl ListView {
    fn new(category: TaskCategory) -> Self {
        ListView {
            category,
            page: 1,
            ordering: None,
            has_next: false,
            has_previous: false,
            order_fields: Vec::new(),
            tasks: Vec::new(),
            phase: LoadPhase::Idle,
        }
    }

    pub fn find(&self, id: i64) -> Option<&TaskRecord> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    fn apply_page(&mut self, page: TaskPage) {
        let mut fields: Vec<&'static str> = Vec::new();
        for record in &page.results {
            for field in record.field_names() {
                if !fields.contains(field) {
                    fields.push(field);
                }
            }
        }
        self.order_fields = fields;
        self.tasks = page.results;
        self.has_next = page.has_next;
        self.has_previous = page.has_previous;
        self.phase = LoadPhase::Loaded;
    }
}

struct Inner {
    view: ListView,
    generation: u64,
    pending: Option<CancellationToken>,
    closed: bool,
}

pub struct TaskListController {
    gateway: Arc<dyn TaskGateway>,
    debounce: Duration,
    runtime: Handle,
    inner: Arc<Mutex<Inner>>,
    revision: Arc<watch::Sender<u64>>,
}

impl TaskListController {
    /// Must be called from within a tokio runtime.
    pub fn new(gateway: Arc<dyn TaskGateway>, category: TaskCategory, debounce: Duration) -> Self {
        Self::with_handle(gateway, category, debounce, Handle::current())
    }

    pub fn with_handle(
        gateway: Arc<dyn TaskGateway>,
        category: TaskCategory,
        debounce: Duration,
        runtime: Handle,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        TaskListController {
            gateway,
            debounce,
            runtime,
            inner: Arc::new(Mutex::new(Inner {
                view: ListView::new(category),
                generation: 0,
                pending: None,
                closed: false,
            })),
            revision: Arc::new(revision),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    pub fn snapshot(&self) -> ListView {
        self.lock().view.clone()
    }

    /// Bumped every time the view changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Initial load, as when the view is first shown.
    pub fn load(&self) {
        let mut inner = self.lock();
        self.schedule_fetch(&mut inner);
    }

    pub fn refresh(&self) {
        self.load();
    }

    /// Leaves the page number alone; callers that want page 1 set it themselves.
    pub fn set_category(&self, category: TaskCategory) {
        let mut inner = self.lock();
        if inner.view.category == category {
            return;
        }
        inner.view.category = category;
        self.schedule_fetch(&mut inner);
    }

    /// Category change that also goes back to page 1, in one fetch.
    pub fn switch_category(&self, category: TaskCategory) {
        let mut inner = self.lock();
        if inner.view.category == category && inner.view.page == 1 {
            return;
        }
        inner.view.category = category;
        inner.view.page = 1;
        self.schedule_fetch(&mut inner);
    }

    pub fn set_page(&self, page: u32) {
        let page = page.max(1);
        let mut inner = self.lock();
        if inner.view.page == page {
            return;
        }
        inner.view.page = page;
        self.schedule_fetch(&mut inner);
    }

    pub fn set_ordering(&self, ordering: Option<OrderBy>) {
        let mut inner = self.lock();
        if inner.view.ordering == ordering {
            return;
        }
        inner.view.ordering = ordering;
        self.schedule_fetch(&mut inner);
    }

    /// Returns false without fetching when there is no next page.
    pub fn next_page(&self) -> bool {
        let mut inner = self.lock();
        if !inner.view.has_next {
            return false;
        }
        inner.view.page += 1;
        self.schedule_fetch(&mut inner);
        true
    }

    /// Returns false without fetching when there is no previous page.
    pub fn previous_page(&self) -> bool {
        let mut inner = self.lock();
        if !inner.view.has_previous || inner.view.page <= 1 {
            return false;
        }
        inner.view.page -= 1;
        self.schedule_fetch(&mut inner);
        true
    }

    fn schedule_fetch(&self, inner: &mut Inner) {
        if inner.closed {
            return;
        }
        if let Some(previous) = inner.pending.take() {
            previous.cancel();
        }
        inner.generation += 1;

        let generation = inner.generation;
        let cancel = CancellationToken::new();
        inner.pending = Some(cancel.clone());

        let category = inner.view.category;
        let page = inner.view.page;
        let ordering = inner.view.ordering.clone();
        let gateway = self.gateway.clone();
        let shared = self.inner.clone();
        let revision = self.revision.clone();
        let debounce = self.debounce;

        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            {
                let mut inner = lock_inner(&shared);
                if inner.generation != generation {
                    return;
                }
                inner.view.phase = LoadPhase::Loading;
            }
            revision.send_modify(|rev| *rev += 1);

            log::debug!("Fetching {} tasks page {} ordering {:?}", category, page, ordering);
            let result = gateway.list(category, page, ordering.as_ref(), Some(&cancel)).await;

            let mut inner = lock_inner(&shared);
            if cancel.is_cancelled() || inner.generation != generation {
                log::debug!("Discarding superseded response for {} page {}", category, page);
                return;
            }
            inner.pending = None;

            match result {
                Ok(fetched) => inner.view.apply_page(fetched),
                Err(ApiError::Canceled) => {
                    log::debug!("Fetch for {} page {} canceled", category, page);
                    return;
                }
                Err(e) => {
                    log::error!("Failed to fetch paginated tasks: {}", e);
                    inner.view.phase = LoadPhase::Error;
                }
            }
            drop(inner);
            revision.send_modify(|rev| *rev += 1);
        });
    }

    /// Resource a record lives under. Records still on screen after a category
    /// switch keep their own category; unknown ids use the view's.
    fn category_of(&self, id: i64) -> TaskCategory {
        let inner = self.lock();
        inner.view.find(id).map(TaskRecord::category).unwrap_or(inner.view.category)
    }

    /// Confirm-then-patch: the cached record changes only after the backend accepts.
    /// Returns `Ok(false)` when the priority is already the requested one.
    pub async fn update_priority(&self, id: i64, priority: Priority) -> Result<bool, ApiError> {
        let category = {
            let inner = self.lock();
            match inner.view.find(id) {
                Some(task) if task.priority() == priority => return Ok(false),
                Some(task) => task.category(),
                None => inner.view.category,
            }
        };

        if let Err(e) = self.gateway.update(category, id, &TaskPatch::priority(priority)).await {
            log::error!("Failed to update priority: {}", e);
            return Err(e);
        }

        self.patch_record(category, id, |task| task.set_priority(priority));
        Ok(true)
    }

    pub async fn toggle_complete(&self, id: i64) -> Result<(), ApiError> {
        let category = self.category_of(id);
        let updated = self.gateway.toggle_complete(category, id).await?;
        let completed = updated.common().is_completed;
        self.patch_record(category, id, |task| task.set_completed(completed));
        Ok(())
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let category = self.category_of(id);
        self.gateway.remove(category, id).await?;

        let mut inner = self.lock();
        if inner.closed {
            return Ok(());
        }
        inner
            .view
            .tasks
            .retain(|task| task.id() != id || task.category() != category);
        drop(inner);
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }

    fn patch_record(&self, category: TaskCategory, id: i64, patch: impl FnOnce(&mut TaskRecord)) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        let Some(task) = inner
            .view
            .tasks
            .iter_mut()
            .find(|task| task.id() == id && task.category() == category)
        else {
            return;
        };
        patch(task);
        drop(inner);
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Cancels the pending fetch; nothing is written to the view afterwards.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.generation += 1;
        if let Some(pending) = inner.pending.take() {
            pending.cancel();
        }
    }
}

impl Drop for TaskListController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Next step in the ordering selector: each field ascending, then descending,
/// then back to no ordering.
pub fn next_ordering(current: Option<&OrderBy>, fields: &[&'static str]) -> Option<OrderBy> {
    let first = fields.first()?;
    let Some(current) = current else {
        return Some(OrderBy::asc(*first));
    };
    if !current.descending {
        return Some(OrderBy::desc(current.field.clone()));
    }
    let position = fields.iter().position(|f| *f == current.field)?;
    fields.get(position + 1).map(|field| OrderBy::asc(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, SingleTask, TaskCommon};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    const DEBOUNCE: Duration = Duration::from_millis(200);

    #[derive(Debug, Clone, PartialEq)]
    struct ListCall {
        category: TaskCategory,
        page: u32,
        ordering: Option<String>,
    }

    /// In-memory gateway; it ignores cancellation so late responses really arrive.
    #[derive(Default)]
    struct FakeGateway {
        list_calls: Mutex<Vec<ListCall>>,
        update_calls: Mutex<Vec<(TaskCategory, i64, TaskPatch)>>,
        item_calls: Mutex<Vec<(&'static str, TaskCategory, i64)>>,
        delays: Mutex<HashMap<u32, Duration>>,
        pages: Mutex<HashMap<(TaskCategory, u32), TaskPage>>,
        fail_lists: AtomicBool,
        fail_updates: AtomicBool,
    }

    impl FakeGateway {
        fn with_page(self, category: TaskCategory, page: u32, tasks: TaskPage) -> Self {
            self.pages.lock().unwrap().insert((category, page), tasks);
            self
        }

        fn with_delay(self, page: u32, delay: Duration) -> Self {
            self.delays.lock().unwrap().insert(page, delay);
            self
        }

        fn list_calls(&self) -> Vec<ListCall> {
            self.list_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskGateway for FakeGateway {
        async fn list(
            &self,
            category: TaskCategory,
            page: u32,
            ordering: Option<&OrderBy>,
            _cancel: Option<&CancellationToken>,
        ) -> Result<TaskPage, ApiError> {
            self.list_calls.lock().unwrap().push(ListCall {
                category,
                page,
                ordering: ordering.map(OrderBy::to_param),
            });
            let delay = self.delays.lock().unwrap().get(&page).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_lists.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    detail: "server error".into(),
                });
            }
            Ok(self
                .pages
                .lock()
                .unwrap()
                .get(&(category, page))
                .cloned()
                .unwrap_or_default())
        }

        async fn get(&self, _category: TaskCategory, _id: i64) -> Result<TaskRecord, ApiError> {
            unimplemented!()
        }

        async fn create(&self, _task: &NewTask) -> Result<TaskRecord, ApiError> {
            unimplemented!()
        }

        async fn update(
            &self,
            category: TaskCategory,
            id: i64,
            patch: &TaskPatch,
        ) -> Result<Option<TaskRecord>, ApiError> {
            self.update_calls.lock().unwrap().push((category, id, patch.clone()));
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 400,
                    detail: "bad".into(),
                });
            }
            Ok(None)
        }

        async fn remove(&self, category: TaskCategory, id: i64) -> Result<(), ApiError> {
            self.item_calls.lock().unwrap().push(("remove", category, id));
            Ok(())
        }

        async fn toggle_complete(&self, category: TaskCategory, id: i64) -> Result<TaskRecord, ApiError> {
            self.item_calls.lock().unwrap().push(("toggle", category, id));
            let mut record = single(id, "done", Priority::Medium);
            record.set_completed(true);
            Ok(record)
        }
    }

    fn single(id: i64, title: &str, priority: Priority) -> TaskRecord {
        TaskRecord::Single(SingleTask {
            common: TaskCommon {
                id,
                title: title.to_string(),
                description: String::new(),
                priority,
                postponed_count: 0,
                smart_priority: false,
                is_completed: false,
                created_at: None,
                updated_at: None,
            },
            due_date: None,
        })
    }

    fn page_of(tasks: Vec<TaskRecord>, has_next: bool, has_previous: bool) -> TaskPage {
        TaskPage {
            results: tasks,
            has_next,
            has_previous,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    fn controller(gateway: Arc<FakeGateway>) -> TaskListController {
        TaskListController::new(gateway, TaskCategory::Single, DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_issue_one_fetch_with_final_parameters() {
        let gateway = Arc::new(FakeGateway::default());
        let list = controller(gateway.clone());

        list.load();
        tokio::time::sleep(Duration::from_millis(50)).await;
        list.set_category(TaskCategory::Daily);
        tokio::time::sleep(Duration::from_millis(150)).await;
        list.set_page(3);
        tokio::time::sleep(Duration::from_millis(199)).await;
        list.set_ordering(Some(OrderBy::desc("priority")));
        settle().await;

        assert_eq!(
            gateway.list_calls(),
            vec![ListCall {
                category: TaskCategory::Daily,
                page: 3,
                ordering: Some("-priority".into()),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_from_superseded_fetch_is_discarded() {
        let gateway = Arc::new(
            FakeGateway::default()
                .with_page(TaskCategory::Single, 1, page_of(vec![single(1, "stale", Priority::Low)], true, false))
                .with_page(TaskCategory::Single, 2, page_of(vec![single(2, "fresh", Priority::Low)], false, true))
                .with_delay(1, Duration::from_secs(2))
                .with_delay(2, Duration::from_millis(10)),
        );
        let list = controller(gateway.clone());

        list.load();
        // first fetch is now in flight and slow
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(list.snapshot().phase, LoadPhase::Loading);
        list.set_page(2);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let view = list.snapshot();
        assert_eq!(gateway.list_calls().len(), 2);
        assert_eq!(view.tasks.len(), 1);
        assert_eq!(view.tasks[0].title(), "fresh");
        assert_eq!(view.page, 2);
        assert!(view.has_previous);
        assert!(!view.has_next);
        assert_eq!(view.phase, LoadPhase::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn previous_is_disallowed_on_first_page_and_next_fetches_page_two() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(vec![single(1, "a", Priority::Medium)], true, false),
        ));
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        assert!(!list.previous_page());
        settle().await;
        assert_eq!(gateway.list_calls().len(), 1);

        assert!(list.next_page());
        settle().await;
        let calls = gateway.list_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].page, 2);
        assert_eq!(list.snapshot().page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn next_is_disallowed_without_next_page() {
        let gateway = Arc::new(FakeGateway::default());
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        assert!(!list.next_page());
        assert_eq!(list.snapshot().page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_previous_list() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(vec![single(1, "kept", Priority::Medium)], false, false),
        ));
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        gateway.fail_lists.store(true, Ordering::SeqCst);
        list.refresh();
        settle().await;

        let view = list.snapshot();
        assert_eq!(view.phase, LoadPhase::Error);
        assert_eq!(view.tasks.len(), 1);
        assert_eq!(view.tasks[0].title(), "kept");
    }

    #[tokio::test(start_paused = true)]
    async fn order_fields_follow_the_fetched_page() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(vec![single(1, "a", Priority::Medium)], false, false),
        ));
        let list = controller(gateway.clone());
        list.load();
        settle().await;
        assert!(list.snapshot().order_fields.contains(&"due_date"));

        list.set_category(TaskCategory::Daily);
        settle().await;
        let view = list.snapshot();
        assert!(view.tasks.is_empty());
        assert!(view.order_fields.is_empty());
        // category change leaves the page alone
        assert_eq!(view.page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn priority_update_is_skipped_when_unchanged() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(vec![single(5, "a", Priority::High)], false, false),
        ));
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        assert!(!list.update_priority(5, Priority::High).await.unwrap());
        assert!(gateway.update_calls.lock().unwrap().is_empty());

        assert!(list.update_priority(5, Priority::VeryLow).await.unwrap());
        let calls = gateway.update_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(TaskCategory::Single, 5, TaskPatch::priority(Priority::VeryLow))]);
        assert_eq!(list.snapshot().find(5).unwrap().priority(), Priority::VeryLow);
        // no refetch after a priority change
        assert_eq!(gateway.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_priority_update_leaves_cache_alone() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(vec![single(5, "a", Priority::High)], false, false),
        ));
        gateway.fail_updates.store(true, Ordering::SeqCst);
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        assert!(list.update_priority(5, Priority::Low).await.is_err());
        assert_eq!(list.snapshot().find(5).unwrap().priority(), Priority::High);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_and_remove_patch_the_cached_list() {
        let gateway = Arc::new(FakeGateway::default().with_page(
            TaskCategory::Single,
            1,
            page_of(
                vec![single(1, "a", Priority::High), single(2, "b", Priority::Low)],
                false,
                false,
            ),
        ));
        let list = controller(gateway.clone());
        list.load();
        settle().await;

        list.toggle_complete(1).await.unwrap();
        assert!(list.snapshot().find(1).unwrap().common().is_completed);

        list.remove(2).await.unwrap();
        let view = list.snapshot();
        assert_eq!(view.tasks.len(), 1);
        assert!(view.find(2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_prevents_late_writes() {
        let gateway = Arc::new(
            FakeGateway::default()
                .with_page(TaskCategory::Single, 1, page_of(vec![single(1, "a", Priority::High)], false, false))
                .with_delay(1, Duration::from_secs(1)),
        );
        let list = controller(gateway.clone());
        list.load();
        tokio::time::sleep(Duration::from_millis(300)).await;
        list.shutdown();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(list.snapshot().tasks.is_empty());
        list.refresh();
        settle().await;
        assert_eq!(gateway.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn revision_bumps_on_commit() {
        let gateway = Arc::new(FakeGateway::default());
        let list = controller(gateway);
        let mut rx = list.subscribe();
        list.load();
        settle().await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        assert_eq!(list.snapshot().phase, LoadPhase::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_after_category_switch_target_the_record_category() {
        let gateway = Arc::new(
            FakeGateway::default()
                .with_page(
                    TaskCategory::Single,
                    1,
                    page_of(
                        vec![single(5, "rent", Priority::High), single(6, "gym", Priority::Low)],
                        false,
                        false,
                    ),
                )
                .with_delay(1, Duration::from_secs(1)),
        );
        let list = controller(gateway.clone());
        list.load();
        tokio::time::sleep(Duration::from_secs(2)).await;

        // daily fetch is still pending; the single records are on screen
        list.set_category(TaskCategory::Daily);
        assert_eq!(list.snapshot().find(5).unwrap().category(), TaskCategory::Single);

        assert!(list.update_priority(5, Priority::Low).await.unwrap());
        list.toggle_complete(5).await.unwrap();
        list.remove(6).await.unwrap();

        assert_eq!(
            gateway.update_calls.lock().unwrap().clone(),
            vec![(TaskCategory::Single, 5, TaskPatch::priority(Priority::Low))]
        );
        assert_eq!(
            gateway.item_calls.lock().unwrap().clone(),
            vec![("toggle", TaskCategory::Single, 5), ("remove", TaskCategory::Single, 6)]
        );
        let view = list.snapshot();
        assert_eq!(view.find(5).unwrap().priority(), Priority::Low);
        assert!(view.find(5).unwrap().common().is_completed);
        assert!(view.find(6).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_uses_the_view_category() {
        let gateway = Arc::new(FakeGateway::default());
        let list = TaskListController::new(gateway.clone(), TaskCategory::Instance, DEBOUNCE);

        list.remove(9).await.unwrap();
        assert_eq!(
            gateway.item_calls.lock().unwrap().clone(),
            vec![("remove", TaskCategory::Instance, 9)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn switching_category_returns_to_first_page_in_one_fetch() {
        let gateway = Arc::new(FakeGateway::default());
        let list = controller(gateway.clone());
        list.set_page(3);
        settle().await;
        assert_eq!(gateway.list_calls().len(), 1);

        list.switch_category(TaskCategory::Daily);
        settle().await;

        let calls = gateway.list_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            ListCall {
                category: TaskCategory::Daily,
                page: 1,
                ordering: None,
            }
        );
        let view = list.snapshot();
        assert_eq!((view.category, view.page), (TaskCategory::Daily, 1));

        list.switch_category(TaskCategory::Daily);
        settle().await;
        assert_eq!(gateway.list_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn category_and_page_reset_in_one_window_fetch_once() {
        let gateway = Arc::new(FakeGateway::default());
        let list = controller(gateway.clone());
        list.set_page(3);
        settle().await;

        list.set_category(TaskCategory::Daily);
        list.set_page(1);
        settle().await;

        let calls = gateway.list_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[1].category, calls[1].page), (TaskCategory::Daily, 1));
    }

    #[test]
    fn ordering_cycles_through_fields() {
        let fields = ["id", "title"];
        let step1 = next_ordering(None, &fields);
        assert_eq!(step1, Some(OrderBy::asc("id")));
        let step2 = next_ordering(step1.as_ref(), &fields);
        assert_eq!(step2, Some(OrderBy::desc("id")));
        let step3 = next_ordering(step2.as_ref(), &fields);
        assert_eq!(step3, Some(OrderBy::asc("title")));
        let step4 = next_ordering(Some(&OrderBy::desc("title")), &fields);
        assert_eq!(step4, None);
        assert_eq!(next_ordering(None, &[]), None);
    }
}

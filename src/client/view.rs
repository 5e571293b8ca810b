use std::collections::HashSet;

use crate::models::{
    ListParams, SortField, SortOrder, Task, TaskPage, TaskPriority, TaskStatus,
};

/// Create/edit form state. `editing` holds the target id while editing an
/// existing task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub editing: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: String,
}

impl TaskForm {
    fn prefilled(task: &Task) -> Self {
        TaskForm {
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

/// Task list view state. Search and status filter apply client-side to the
/// current page only; sort and page number are server-side and signal a
/// refetch when they change. Mutation events update the list optimistically;
/// the host refetches the authoritative page afterwards.
pub struct TaskView {
    page: TaskPage,
    loading: bool,
    search: String,
    status_filter: Option<TaskStatus>,
    sort_by: SortField,
    sort_order: SortOrder,
    page_no: i64,
    selected: HashSet<i64>,
    form: Option<TaskForm>,
}

impl Default for TaskView {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskView {
    pub fn new() -> Self {
        TaskView {
            page: TaskPage::default(),
            loading: true,
            search: String::new(),
            status_filter: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page_no: 1,
            selected: HashSet::new(),
            form: None,
        }
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn tasks(&self) -> &[Task] {
        &self.page.tasks
    }

    pub fn stats(&self) -> &crate::models::TaskStats {
        &self.page.stats
    }

    pub fn pages(&self) -> i64 {
        self.page.pages
    }

    /// Query parameters for the next page fetch.
    pub fn query(&self) -> ListParams {
        ListParams {
            page: Some(self.page_no),
            limit: None,
            sort_by: Some(self.sort_by),
            sort_order: Some(self.sort_order),
        }
    }

    pub fn fetch_started(&mut self) {
        self.loading = true;
    }

    pub fn page_loaded(&mut self, page: TaskPage) {
        self.page_no = page.page;
        self.page = page;
        self.loading = false;
    }

    /// A failed fetch keeps the previous list on screen.
    pub fn fetch_failed(&mut self) {
        self.loading = false;
    }

    // --- Client-side filters (current page only) ---

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn set_status_filter(&mut self, filter: Option<TaskStatus>) {
        self.status_filter = filter;
    }

    pub fn visible(&self) -> Vec<&Task> {
        let needle = self.search.to_lowercase();
        self.page
            .tasks
            .iter()
            .filter(|task| {
                let matches_search = needle.is_empty()
                    || task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle));
                let matches_status =
                    self.status_filter.map_or(true, |status| task.status == status);
                matches_search && matches_status
            })
            .collect()
    }

    // --- Server-side list parameters; `true` means refetch ---

    pub fn set_sort(&mut self, sort_by: SortField, sort_order: SortOrder) -> bool {
        if self.sort_by == sort_by && self.sort_order == sort_order {
            return false;
        }
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self.page_no = 1;
        true
    }

    pub fn set_page(&mut self, page: i64) -> bool {
        let page = page.max(1);
        if self.page_no == page {
            return false;
        }
        self.page_no = page;
        true
    }

    // --- Selection ---

    pub fn toggle_selected(&mut self, id: i64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // --- Optimistic mutation events ---

    pub fn created(&mut self, task: Task) {
        self.page.tasks.insert(0, task);
        self.page.total += 1;
    }

    pub fn updated(&mut self, task: Task) {
        if let Some(slot) = self.page.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    pub fn deleted(&mut self, id: i64) {
        self.page.tasks.retain(|t| t.id != id);
        self.page.total -= 1;
        self.selected.remove(&id);
    }

    pub fn bulk_deleted(&mut self, ids: &[i64]) {
        self.page.tasks.retain(|t| !ids.contains(&t.id));
        self.page.total -= ids.len() as i64;
        self.selected.clear();
    }

    pub fn bulk_status_applied(&mut self, updated: &[Task]) {
        for task in updated {
            self.updated(task.clone());
        }
        self.selected.clear();
    }

    // --- Form state ---

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    pub fn open_create(&mut self) {
        self.form = Some(TaskForm::default());
    }

    pub fn open_edit(&mut self, task: &Task) {
        self.form = Some(TaskForm::prefilled(task));
    }

    /// Submission failure leaves the form open for correction; only call this
    /// once the mutation succeeded.
    pub fn form_submitted(&mut self) {
        self.form = None;
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: Some(format!("notes for {title}")),
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            owner_id: 1,
        }
    }

    fn loaded_view(tasks: Vec<Task>) -> TaskView {
        let mut view = TaskView::new();
        let total = tasks.len() as i64;
        view.page_loaded(TaskPage {
            tasks,
            total,
            page: 1,
            pages: 1,
            limit: 10,
            stats: Default::default(),
        });
        view
    }

    #[test]
    fn search_and_status_filter_apply_to_current_page() {
        let mut view = loaded_view(vec![
            task(1, "Buy milk", TaskStatus::Pending),
            task(2, "Ship release", TaskStatus::InProgress),
            task(3, "buy stamps", TaskStatus::Completed),
        ]);

        view.set_search("buy");
        let titles: Vec<_> = view.visible().iter().map(|t| t.id).collect();
        assert_eq!(titles, vec![1, 3]);

        view.set_status_filter(Some(TaskStatus::Completed));
        let titles: Vec<_> = view.visible().iter().map(|t| t.id).collect();
        assert_eq!(titles, vec![3]);

        view.set_search("");
        view.set_status_filter(None);
        assert_eq!(view.visible().len(), 3);
    }

    #[test]
    fn search_matches_description_too() {
        let mut view = loaded_view(vec![task(1, "Errand", TaskStatus::Pending)]);
        view.set_search("notes for errand");
        assert_eq!(view.visible().len(), 1);
    }

    #[test]
    fn sort_change_resets_page_and_signals_refetch() {
        let mut view = TaskView::new();
        assert!(view.set_page(3));
        assert!(!view.set_page(3));

        assert!(view.set_sort(SortField::Priority, SortOrder::Asc));
        assert_eq!(view.query().page, Some(1));
        assert!(!view.set_sort(SortField::Priority, SortOrder::Asc));
    }

    #[test]
    fn fetch_failure_keeps_previous_list() {
        let mut view = loaded_view(vec![task(1, "Keep me", TaskStatus::Pending)]);
        view.fetch_started();
        view.fetch_failed();
        assert!(!view.loading());
        assert_eq!(view.tasks().len(), 1);
    }

    #[test]
    fn deleting_a_task_prunes_its_selection() {
        let mut view = loaded_view(vec![
            task(1, "a", TaskStatus::Pending),
            task(2, "b", TaskStatus::Pending),
        ]);
        view.toggle_selected(1);
        view.toggle_selected(2);

        view.deleted(1);
        assert_eq!(view.selected_ids(), vec![2]);
        assert_eq!(view.tasks().len(), 1);
    }

    #[test]
    fn bulk_actions_clear_selection() {
        let mut view = loaded_view(vec![
            task(1, "a", TaskStatus::Pending),
            task(2, "b", TaskStatus::Pending),
            task(3, "c", TaskStatus::Pending),
        ]);
        view.toggle_selected(1);
        view.toggle_selected(2);

        view.bulk_deleted(&[1, 2]);
        assert!(view.selected_ids().is_empty());
        assert_eq!(view.tasks().len(), 1);

        view.toggle_selected(3);
        let mut done = task(3, "c", TaskStatus::Completed);
        done.owner_id = 1;
        view.bulk_status_applied(&[done]);
        assert!(view.selected_ids().is_empty());
        assert_eq!(view.tasks()[0].status, TaskStatus::Completed);
    }

    #[test]
    fn create_prepends_optimistically() {
        let mut view = loaded_view(vec![task(1, "old", TaskStatus::Pending)]);
        view.created(task(2, "new", TaskStatus::Pending));
        assert_eq!(view.tasks()[0].id, 2);
    }

    #[test]
    fn edit_form_is_prefilled_and_closes_on_success_only() {
        let t = task(7, "Edit me", TaskStatus::InProgress);
        let mut view = loaded_view(vec![t.clone()]);

        view.open_edit(&t);
        let form = view.form().unwrap();
        assert_eq!(form.editing, Some(7));
        assert_eq!(form.title, "Edit me");
        assert_eq!(form.status, TaskStatus::InProgress);

        // submission failed: the form stays open
        assert!(view.form().is_some());

        view.form_submitted();
        assert!(view.form().is_none());
    }
}

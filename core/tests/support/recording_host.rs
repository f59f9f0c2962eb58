use libvarnam_core::HostText;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Marked(String, usize),
    Commit(String),
    ClearMarked,
    Candidates(Vec<String>),
    Show,
    Hide,
    Select(usize),
}

/// Host that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    pub window_selection: Option<usize>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Commit(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_marked(&self) -> Option<(String, usize)> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::Marked(text, cursor) => Some((text.clone(), *cursor)),
            HostCall::ClearMarked => Some((String::new(), 0)),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl HostText for RecordingHost {
    fn set_marked_text(&mut self, text: &str, cursor: usize) {
        self.calls.push(HostCall::Marked(text.to_string(), cursor));
    }

    fn commit_text(&mut self, text: &str) {
        self.calls.push(HostCall::Commit(text.to_string()));
    }

    fn clear_marked_text(&mut self) {
        self.calls.push(HostCall::ClearMarked);
    }

    fn update_candidates(&mut self, candidates: &[String]) {
        self.window_selection = None;
        self.calls.push(HostCall::Candidates(candidates.to_vec()));
    }

    fn show_candidates(&mut self) {
        self.calls.push(HostCall::Show);
    }

    fn hide_candidates(&mut self) {
        self.calls.push(HostCall::Hide);
    }

    fn select_candidate(&mut self, index: usize) {
        self.window_selection = Some(index);
        self.calls.push(HostCall::Select(index));
    }

    fn selected_candidate_index(&self) -> Option<usize> {
        self.window_selection
    }
}

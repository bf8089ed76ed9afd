use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginPanel {
    pub chapter: String,
    pub error: Option<String>,
    pub pending: bool,
}

impl LoginPanel {
    pub fn begin(&mut self, chapter: &str) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        self.chapter = chapter.to_string();
        self.error = None;
        true
    }

    pub fn succeeded(&mut self) {
        *self = Self::default();
    }

    /// Also used to explain a forced logout.
    pub fn failed(&mut self, message: String) {
        self.pending = false;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_attempt_at_a_time() {
        let mut panel = LoginPanel::default();
        assert!(panel.begin("宜一"));
        assert!(!panel.begin("宜一"));
        panel.failed("分院代號或密碼錯誤".into());
        assert!(!panel.pending);
        assert_eq!(panel.chapter, "宜一");
        assert!(panel.begin("宜一"));
        panel.succeeded();
        assert!(panel.error.is_none());
    }
}

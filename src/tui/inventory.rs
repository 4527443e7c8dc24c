//! 列表视图模型：过滤、光标与滚动

use crate::package_manager::PackageRecord;

#[derive(Debug, Clone)]
pub struct InventoryModel {
    source: Vec<PackageRecord>,
    filter: String,
    /// 指向 source 的下标
    filtered: Vec<usize>,
    /// 过滤结果为空时为 -1，否则总是有效下标
    cursor: isize,
    scroll: usize,
    viewport_height: usize,
}

impl Default for InventoryModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryModel {
    pub fn new() -> Self {
        Self {
            source: Vec::new(),
            filter: String::new(),
            filtered: Vec::new(),
            cursor: -1,
            scroll: 0,
            viewport_height: 1,
        }
    }

    /// 整体替换数据源并重新应用当前过滤
    pub fn set_source(&mut self, source: Vec<PackageRecord>) {
        self.source = source;
        self.apply_filter();
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.apply_filter();
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.adjust_scroll();
    }

    /// 名称不区分大小写的子串匹配
    fn apply_filter(&mut self) {
        let keyword = self.filter.trim().to_lowercase();
        self.filtered = self
            .source
            .iter()
            .enumerate()
            .filter(|(_, r)| keyword.is_empty() || r.name.to_lowercase().contains(&keyword))
            .map(|(i, _)| i)
            .collect();

        if self.filtered.is_empty() {
            self.cursor = -1;
        } else if self.cursor < 0 || self.cursor as usize >= self.filtered.len() {
            self.cursor = 0;
        }
        self.adjust_scroll();
    }

    /// 最小幅度调整滚动偏移，使光标可见
    fn adjust_scroll(&mut self) {
        if self.cursor < 0 {
            self.scroll = 0;
            return;
        }
        let cursor = self.cursor as usize;
        if cursor < self.scroll {
            self.scroll = cursor;
        } else if cursor >= self.scroll + self.viewport_height {
            self.scroll = cursor + 1 - self.viewport_height;
        }
        let max_scroll = self.filtered.len().saturating_sub(self.viewport_height);
        self.scroll = self.scroll.min(max_scroll);
    }

    fn move_to(&mut self, index: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.cursor = index.clamp(0, last);
        self.adjust_scroll();
    }

    pub fn move_up(&mut self) {
        self.move_to(self.cursor - 1);
    }

    pub fn move_down(&mut self) {
        self.move_to(self.cursor + 1);
    }

    pub fn page_up(&mut self) {
        self.move_to(self.cursor - self.viewport_height as isize);
    }

    pub fn page_down(&mut self) {
        self.move_to(self.cursor + self.viewport_height as isize);
    }

    pub fn home(&mut self) {
        self.move_to(0);
    }

    pub fn end(&mut self) {
        self.move_to(self.filtered.len() as isize - 1);
    }

    #[cfg(test)]
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    pub fn selected(&self) -> Option<&PackageRecord> {
        if self.cursor < 0 {
            return None;
        }
        self.filtered
            .get(self.cursor as usize)
            .and_then(|&i| self.source.get(i))
    }

    /// 当前视口内的记录，附带是否被选中
    pub fn visible(&self) -> impl Iterator<Item = (bool, &PackageRecord)> + '_ {
        let cursor = self.cursor;
        self.filtered
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.viewport_height)
            .map(move |(pos, &i)| (pos as isize == cursor, &self.source[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(names: &[&str]) -> InventoryModel {
        let mut m = InventoryModel::new();
        m.set_source(
            names
                .iter()
                .map(|n| PackageRecord::new(*n, "apt", "1.0", true))
                .collect(),
        );
        m
    }

    fn visible_names(m: &InventoryModel) -> Vec<String> {
        m.visible().map(|(_, r)| r.name.clone()).collect()
    }

    #[test]
    fn test_empty_model_has_no_cursor() {
        let m = InventoryModel::new();
        assert_eq!(m.cursor(), -1);
        assert!(m.selected().is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut m = model(&["Vim", "neovim", "emacs", "vile"]);
        m.set_filter("VI");
        assert_eq!(m.len(), 3);
        assert_eq!(m.selected().unwrap().name, "Vim");

        m.set_filter("zzz");
        assert!(m.is_empty());
        assert_eq!(m.cursor(), -1);

        m.set_filter("");
        assert_eq!(m.len(), 4);
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn test_out_of_bounds_cursor_resets() {
        let mut m = model(&["a1", "a2", "b1", "b2", "b3"]);
        m.end();
        assert_eq!(m.cursor(), 4);
        m.set_filter("a");
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn test_in_bounds_cursor_is_kept() {
        let mut m = model(&["a1", "a2", "a3"]);
        m.move_down();
        m.set_filter("a");
        assert_eq!(m.cursor(), 1);
    }

    #[test]
    fn test_refilter_is_idempotent() {
        let mut m = model(&["vim", "vile", "emacs", "gvim"]);
        m.set_filter("vi");
        m.move_down();
        let first = (visible_names(&m), m.cursor());
        m.set_filter("vi");
        assert_eq!((visible_names(&m), m.cursor()), first);
    }

    #[test]
    fn test_scroll_follows_cursor_minimally() {
        let names: Vec<String> = (0..20).map(|i| format!("pkg{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut m = model(&refs);
        m.set_viewport_height(5);

        for _ in 0..4 {
            m.move_down();
        }
        assert_eq!(m.scroll(), 0);
        m.move_down();
        assert_eq!(m.cursor(), 5);
        assert_eq!(m.scroll(), 1);

        m.page_down();
        assert_eq!(m.cursor(), 10);
        assert_eq!(m.scroll(), 6);

        m.move_up();
        m.move_up();
        assert_eq!(m.scroll(), 6);

        m.end();
        assert_eq!(m.cursor(), 19);
        assert_eq!(m.scroll(), 15);
        assert_eq!(visible_names(&m).last().unwrap(), "pkg19");

        m.home();
        assert_eq!((m.cursor(), m.scroll()), (0, 0));

        m.page_up();
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn test_viewport_shrink_keeps_cursor_visible() {
        let names: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut m = model(&refs);
        m.set_viewport_height(10);
        m.move_to(8);
        m.set_viewport_height(3);
        assert!(m.scroll() <= 8 && 8 < m.scroll() + 3);
        let selected: Vec<bool> = m.visible().map(|(s, _)| s).collect();
        assert_eq!(selected.iter().filter(|s| **s).count(), 1);
    }

    #[test]
    fn test_set_source_reapplies_filter() {
        let mut m = model(&["vim"]);
        m.set_filter("git");
        assert!(m.is_empty());
        m.set_source(vec![
            PackageRecord::new("git", "apt", "2.43", true),
            PackageRecord::new("tig", "apt", "2.5", true),
        ]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.selected().unwrap().name, "git");
    }
}

//! 分页按钮窗口

use stroll_shared::PAGE_WINDOW_SIZE;

/// 当前页附近可见的页码范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
    pub current: u32,
    pub last: u32,
}

impl PageWindow {
    /// 最多 5 个页码，尽量让当前页居中；没有结果时窗口为空
    pub fn new(current: u32, last: u32) -> Self {
        if last == 0 {
            return Self {
                start: 1,
                end: 0,
                current: current.max(1),
                last,
            };
        }
        let current = current.clamp(1, last);
        let half = PAGE_WINDOW_SIZE / 2;
        let start = current
            .saturating_sub(half)
            .min(last.saturating_sub(PAGE_WINDOW_SIZE - 1))
            .max(1);
        let end = (start + PAGE_WINDOW_SIZE - 1).min(last);
        Self {
            start,
            end,
            current,
            last,
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.last
    }

    pub fn prev(&self) -> Option<u32> {
        self.has_prev().then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.current + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(current: u32, last: u32) -> Vec<u32> {
        PageWindow::new(current, last).pages().collect()
    }

    #[test]
    fn centers_current_page() {
        assert_eq!(pages(7, 12), vec![5, 6, 7, 8, 9]);
        assert_eq!(pages(3, 12), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sticks_to_edges() {
        assert_eq!(pages(1, 12), vec![1, 2, 3, 4, 5]);
        assert_eq!(pages(2, 12), vec![1, 2, 3, 4, 5]);
        assert_eq!(pages(12, 12), vec![8, 9, 10, 11, 12]);
        assert_eq!(pages(11, 12), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn short_result_sets() {
        assert_eq!(pages(1, 1), vec![1]);
        assert_eq!(pages(2, 3), vec![1, 2, 3]);
        assert!(PageWindow::new(1, 0).is_empty());
        assert!(!PageWindow::new(1, 0).has_next());
    }

    #[test]
    fn prev_next_at_bounds() {
        let w = PageWindow::new(1, 3);
        assert_eq!(w.prev(), None);
        assert_eq!(w.next(), Some(2));

        let w = PageWindow::new(3, 3);
        assert_eq!(w.prev(), Some(2));
        assert_eq!(w.next(), None);
    }

    #[test]
    fn window_always_contains_current() {
        for last in 1..=20 {
            for current in 1..=last {
                let w = PageWindow::new(current, last);
                assert!(w.start <= current && current <= w.end);
                assert!(w.end - w.start < PAGE_WINDOW_SIZE);
                assert!(w.start >= 1 && w.end <= last);
            }
        }
    }
}

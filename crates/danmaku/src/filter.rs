//! Danmaku filtering and styling.
//!
//! Rules are evaluated in a fixed order and the first match suppresses the item:
//!
//! 1. danmaku disabled
//! 2. placement or colour hidden (`show_*`)
//! 3. placement or colour blocked (`block_*`)
//! 4. guest sender (`block_visitor`)
//! 5. keyword, case-insensitive substring
//! 6. weight below the block level
//! 7. repeated content within the batch (`block_repeat`), first occurrence wins
//!
//! Items that pass carry a [`DanmakuStyle`] derived from the settings.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Serialize, Serializer};

use crate::item::{DanmakuItem, DanmakuMode};
use crate::settings::DanmakuSettings;

/// Placement group a visibility or block toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Scroll,
    Top,
    Bottom,
    Colored,
}

/// Why an item was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    Disabled,
    Hidden(Placement),
    Blocked(Placement),
    Visitor,
    Keyword,
    LowWeight,
    Repeat,
}

impl SuppressReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Hidden(Placement::Scroll) => "hidden_scroll",
            Self::Hidden(Placement::Top) => "hidden_top",
            Self::Hidden(Placement::Bottom) => "hidden_bottom",
            Self::Hidden(Placement::Colored) => "hidden_colored",
            Self::Blocked(Placement::Scroll) => "blocked_scroll",
            Self::Blocked(Placement::Top) => "blocked_top",
            Self::Blocked(Placement::Bottom) => "blocked_bottom",
            Self::Blocked(Placement::Colored) => "blocked_colored",
            Self::Visitor => "visitor",
            Self::Keyword => "keyword",
            Self::LowWeight => "low_weight",
            Self::Repeat => "repeat",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Styling to apply to a displayed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DanmakuStyle {
    pub font_size: u32,
    pub opacity: f32,
    /// Multiplier on the renderer's base horizontal speed
    pub speed: f32,
    /// Items must be placed within the top `display_area` fraction of the screen
    pub display_area: f32,
}

impl DanmakuStyle {
    /// Horizontal speed for a renderer whose base speed is `base` units per second.
    pub fn horizontal_speed(&self, base: f32) -> f32 {
        base * self.speed
    }

    /// Lowest allowed vertical position for a screen of the given height.
    pub fn vertical_limit(&self, screen_height: f32) -> f32 {
        screen_height * self.display_area
    }
}

/// Outcome for a single item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Show(DanmakuStyle),
    Suppress(SuppressReason),
}

/// An item that passed the filter, with its style.
#[derive(Debug, Clone, Serialize)]
pub struct StyledDanmaku<'a> {
    pub item: &'a DanmakuItem,
    pub style: DanmakuStyle,
}

/// Counts of what a batch run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterReport {
    pub total: usize,
    pub shown: usize,
    #[serde(serialize_with = "serialize_counts")]
    pub suppressed: FxHashMap<SuppressReason, usize>,
}

fn serialize_counts<S: Serializer>(
    counts: &FxHashMap<SuppressReason, usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    counts
        .iter()
        .map(|(reason, count)| (reason.label(), *count))
        .collect::<BTreeMap<_, _>>()
        .serialize(serializer)
}

impl FilterReport {
    pub fn suppressed_total(&self) -> usize {
        self.suppressed.values().sum()
    }

    pub fn count(&self, reason: SuppressReason) -> usize {
        self.suppressed.get(&reason).copied().unwrap_or(0)
    }
}

/// Filter bound to one settings snapshot.
///
/// Holds no state between batches; the repeat memo lives only inside
/// [`DanmakuFilter::apply`].
#[derive(Debug)]
pub struct DanmakuFilter<'s> {
    settings: &'s DanmakuSettings,
    keywords: Vec<String>,
}

impl<'s> DanmakuFilter<'s> {
    pub fn new(settings: &'s DanmakuSettings) -> Self {
        let keywords = settings
            .block_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { settings, keywords }
    }

    /// Evaluate every rule except repeat detection, which needs the batch.
    pub fn check(&self, item: &DanmakuItem) -> Verdict {
        match self.suppress_reason(item) {
            Some(reason) => Verdict::Suppress(reason),
            None => Verdict::Show(self.style_for(item)),
        }
    }

    fn suppress_reason(&self, item: &DanmakuItem) -> Option<SuppressReason> {
        let s = self.settings;
        if !s.enabled {
            return Some(SuppressReason::Disabled);
        }

        let placement = match item.mode {
            DanmakuMode::Scroll => Some((Placement::Scroll, s.show_scroll, s.block_scroll)),
            DanmakuMode::Top => Some((Placement::Top, s.show_top, s.block_top)),
            DanmakuMode::Bottom => Some((Placement::Bottom, s.show_bottom, s.block_bottom)),
            _ => None,
        };
        let colored = item.is_colored();

        if let Some((p, false, _)) = placement {
            return Some(SuppressReason::Hidden(p));
        }
        if colored && !s.show_color {
            return Some(SuppressReason::Hidden(Placement::Colored));
        }

        if let Some((p, _, true)) = placement {
            return Some(SuppressReason::Blocked(p));
        }
        if colored && s.block_color {
            return Some(SuppressReason::Blocked(Placement::Colored));
        }

        if s.block_visitor && item.is_guest_sender() {
            return Some(SuppressReason::Visitor);
        }

        if !self.keywords.is_empty() {
            let content = item.content.to_lowercase();
            if self.keywords.iter().any(|k| content.contains(k.as_str())) {
                return Some(SuppressReason::Keyword);
            }
        }

        if item.weight < s.block_level.min_weight() {
            return Some(SuppressReason::LowWeight);
        }

        None
    }

    fn style_for(&self, item: &DanmakuItem) -> DanmakuStyle {
        let s = self.settings;
        DanmakuStyle {
            font_size: if item.font_size == 0 {
                s.font_size
            } else {
                item.font_size
            },
            opacity: s.opacity,
            speed: s.speed,
            display_area: s.display_area,
        }
    }

    /// Filter and style one batch, keeping batch order.
    pub fn apply<'a>(&self, items: &'a [DanmakuItem]) -> Vec<StyledDanmaku<'a>> {
        self.apply_with_report(items).0
    }

    /// Like [`apply`](Self::apply), also returning per-reason counts.
    pub fn apply_with_report<'a>(
        &self,
        items: &'a [DanmakuItem],
    ) -> (Vec<StyledDanmaku<'a>>, FilterReport) {
        let mut report = FilterReport {
            total: items.len(),
            ..Default::default()
        };
        if !self.settings.enabled {
            if !items.is_empty() {
                report.suppressed.insert(SuppressReason::Disabled, items.len());
            }
            return (Vec::new(), report);
        }

        let mut seen: FxHashSet<&'a str> = FxHashSet::default();
        let mut shown = Vec::with_capacity(items.len());

        for item in items {
            let mut verdict = self.check(item);
            if matches!(verdict, Verdict::Show(_))
                && self.settings.block_repeat
                && !seen.insert(item.content.as_str())
            {
                verdict = Verdict::Suppress(SuppressReason::Repeat);
            }
            match verdict {
                Verdict::Show(style) => shown.push(StyledDanmaku { item, style }),
                Verdict::Suppress(reason) => {
                    *report.suppressed.entry(reason).or_insert(0) += 1;
                }
            }
        }

        report.shown = shown.len();
        (shown, report)
    }
}

/// Convenience wrapper: filter a batch with the given settings.
pub fn filter_batch<'a>(
    settings: &DanmakuSettings,
    items: &'a [DanmakuItem],
) -> Vec<StyledDanmaku<'a>> {
    DanmakuFilter::new(settings).apply(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::color;
    use crate::settings::BlockLevel;
    use proptest::prelude::*;

    fn item(id: u64, content: &str) -> DanmakuItem {
        DanmakuItem::new(id, id * 100, content)
    }

    fn ids(shown: &[StyledDanmaku<'_>]) -> Vec<u64> {
        shown.iter().map(|s| s.item.id).collect()
    }

    #[test]
    fn test_disabled_renders_nothing() {
        let settings = DanmakuSettings {
            enabled: false,
            ..Default::default()
        };
        let items = vec![item(1, "a"), item(2, "b")];
        let (shown, report) = DanmakuFilter::new(&settings).apply_with_report(&items);
        assert!(shown.is_empty());
        assert_eq!(report.count(SuppressReason::Disabled), 2);
    }

    #[test]
    fn test_show_scroll_toggle() {
        let mut settings = DanmakuSettings {
            show_scroll: false,
            ..Default::default()
        };
        let items = vec![item(1, "scroll"), item(2, "top").with_mode(DanmakuMode::Top)];

        let shown = filter_batch(&settings, &items);
        assert_eq!(ids(&shown), vec![2]);

        settings.show_scroll = true;
        let shown = filter_batch(&settings, &items);
        assert_eq!(ids(&shown), vec![1, 2]);
    }

    #[test]
    fn test_visibility_checked_before_block() {
        let settings = DanmakuSettings {
            show_top: false,
            block_top: true,
            ..Default::default()
        };
        let top = item(1, "x").with_mode(DanmakuMode::Top);
        assert_eq!(
            DanmakuFilter::new(&settings).check(&top),
            Verdict::Suppress(SuppressReason::Hidden(Placement::Top))
        );
    }

    #[test]
    fn test_block_toggles() {
        let settings = DanmakuSettings {
            block_bottom: true,
            block_color: true,
            ..Default::default()
        };
        let filter = DanmakuFilter::new(&settings);

        let bottom = item(1, "x").with_mode(DanmakuMode::Bottom);
        assert_eq!(
            filter.check(&bottom),
            Verdict::Suppress(SuppressReason::Blocked(Placement::Bottom))
        );

        let red = item(2, "x").with_color(color::RED);
        assert_eq!(
            filter.check(&red),
            Verdict::Suppress(SuppressReason::Blocked(Placement::Colored))
        );

        let reverse = item(3, "x").with_mode(DanmakuMode::Reverse);
        assert!(matches!(filter.check(&reverse), Verdict::Show(_)));
    }

    #[test]
    fn test_hidden_color() {
        let settings = DanmakuSettings {
            show_color: false,
            ..Default::default()
        };
        let batch = [item(1, "w"), item(2, "c").with_color(color::CYAN)];
        let shown = filter_batch(&settings, &batch);
        assert_eq!(ids(&shown), vec![1]);
    }

    #[test]
    fn test_block_visitor() {
        let settings = DanmakuSettings {
            block_visitor: true,
            ..Default::default()
        };
        let items = vec![
            item(1, "guest").with_sender_hash("D8f2a"),
            item(2, "member").with_sender_hash("8f2a91c0"),
        ];
        assert_eq!(ids(&filter_batch(&settings, &items)), vec![2]);
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let mut settings = DanmakuSettings::default();
        settings.add_keyword("Spoiler");
        let items = vec![item(1, "big SPOILER ahead"), item(2, "nice")];
        assert_eq!(ids(&filter_batch(&settings, &items)), vec![2]);

        settings.remove_keyword("spoiler");
        assert_eq!(ids(&filter_batch(&settings, &items)), vec![1, 2]);
    }

    #[test]
    fn test_blank_keyword_is_ignored() {
        let settings = DanmakuSettings {
            block_keywords: vec!["  ".to_string()],
            ..Default::default()
        };
        assert_eq!(filter_batch(&settings, &[item(1, "a")]).len(), 1);
    }

    #[test]
    fn test_block_level() {
        let settings = DanmakuSettings {
            block_level: BlockLevel::Medium,
            ..Default::default()
        };
        let items = vec![item(1, "a").with_weight(2), item(2, "b").with_weight(6)];
        let (shown, report) = DanmakuFilter::new(&settings).apply_with_report(&items);
        assert_eq!(ids(&shown), vec![2]);
        assert_eq!(report.count(SuppressReason::LowWeight), 1);
    }

    #[test]
    fn test_repeat_keeps_first() {
        let settings = DanmakuSettings {
            block_repeat: true,
            ..Default::default()
        };
        let items = vec![item(1, "233"), item(2, "hi"), item(3, "233"), item(4, "233 ")];
        let (shown, report) = DanmakuFilter::new(&settings).apply_with_report(&items);
        assert_eq!(ids(&shown), vec![1, 2, 4]);
        assert_eq!(report.count(SuppressReason::Repeat), 1);
        assert_eq!(report.shown, 3);
        assert_eq!(report.suppressed_total(), 1);
    }

    #[test]
    fn test_repeat_ignores_suppressed_first_occurrence() {
        // the first copy is hidden by placement, so the second one is the first shown
        let settings = DanmakuSettings {
            block_repeat: true,
            show_top: false,
            ..Default::default()
        };
        let items = vec![item(1, "dup").with_mode(DanmakuMode::Top), item(2, "dup")];
        assert_eq!(ids(&filter_batch(&settings, &items)), vec![2]);
    }

    #[test]
    fn test_repeat_off_keeps_all() {
        let items = vec![item(1, "233"), item(2, "233")];
        assert_eq!(filter_batch(&DanmakuSettings::default(), &items).len(), 2);
    }

    #[test]
    fn test_style() {
        let settings = DanmakuSettings {
            font_size: 36,
            opacity: 0.5,
            speed: 1.5,
            display_area: 0.25,
            ..Default::default()
        };
        let filter = DanmakuFilter::new(&settings);

        let Verdict::Show(style) = filter.check(&item(1, "a").with_font_size(0)) else {
            panic!("expected item to be shown");
        };
        assert_eq!(style.font_size, 36);
        assert_eq!(style.opacity, 0.5);
        assert_eq!(style.horizontal_speed(100.0), 150.0);
        assert_eq!(style.vertical_limit(1080.0), 270.0);

        let Verdict::Show(style) = filter.check(&item(2, "b").with_font_size(18)) else {
            panic!("expected item to be shown");
        };
        assert_eq!(style.font_size, 18);
    }

    fn arb_item() -> impl Strategy<Value = DanmakuItem> {
        (
            any::<u64>(),
            1i32..=8,
            prop_oneof![Just(color::WHITE), Just(color::RED), 0u32..0xFFFFFF],
            "[a-zA-Z0-9 ]{0,12}",
            prop_oneof![Just(String::new()), "D[0-9a-f]{6}", "[0-9a-f]{8}"],
            0i32..=10,
        )
            .prop_map(|(id, mode, color, content, hash, weight)| {
                DanmakuItem::new(id, 0, content)
                    .with_mode(DanmakuMode::from(mode))
                    .with_color(color)
                    .with_sender_hash(hash)
                    .with_weight(weight)
            })
    }

    proptest! {
        #[test]
        fn prop_disabled_is_empty(items in proptest::collection::vec(arb_item(), 0..32)) {
            let settings = DanmakuSettings { enabled: false, ..Default::default() };
            prop_assert!(filter_batch(&settings, &items).is_empty());
        }

        #[test]
        fn prop_hidden_scroll_never_shown(items in proptest::collection::vec(arb_item(), 0..32)) {
            let hidden = DanmakuSettings { show_scroll: false, ..Default::default() };
            prop_assert!(filter_batch(&hidden, &items)
                .iter()
                .all(|s| s.item.mode != DanmakuMode::Scroll));

            // with nothing blocked every scrolling item comes back
            let shown = filter_batch(&DanmakuSettings::default(), &items);
            let scrolling = items.iter().filter(|i| i.mode == DanmakuMode::Scroll).count();
            prop_assert_eq!(
                shown.iter().filter(|s| s.item.mode == DanmakuMode::Scroll).count(),
                scrolling
            );
        }

        #[test]
        fn prop_keyword_match_suppressed(prefix in "[a-z]{0,5}", suffix in "[a-z]{0,5}") {
            let content = format!("{prefix}SpOiLeR{suffix}");
            let items = vec![DanmakuItem::new(1, 0, content)];

            let mut settings = DanmakuSettings::default();
            settings.add_keyword("spoiler");
            prop_assert!(filter_batch(&settings, &items).is_empty());

            settings.remove_keyword("spoiler");
            prop_assert_eq!(filter_batch(&settings, &items).len(), 1);
        }

        #[test]
        fn prop_deterministic(items in proptest::collection::vec(arb_item(), 0..32), repeat in any::<bool>()) {
            let settings = DanmakuSettings { block_repeat: repeat, block_visitor: true, ..Default::default() };
            let a: Vec<u64> = filter_batch(&settings, &items).iter().map(|s| s.item.id).collect();
            let b: Vec<u64> = filter_batch(&settings, &items).iter().map(|s| s.item.id).collect();
            prop_assert_eq!(a, b);
        }
    }
}

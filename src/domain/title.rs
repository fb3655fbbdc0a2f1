//! 位置标题推导
//!
//! 大纲条目的完整标题由位置决定前缀:
//! - 第一个条目: "Introduction:"
//! - 最后一个条目: "Conclusion:"
//! - 其余条目: "Chapter {position}:"
//!
//! 前缀之后是用户可编辑的自定义标题，为空时使用 "New Chapter"。

use super::book::OutlineEntry;

/// 自定义标题为空时的占位标题
pub const DEFAULT_CUSTOM_TITLE: &str = "New Chapter";

/// 根据位置和总数计算标题前缀
pub fn prefix(position: usize, total: usize) -> String {
    if position == 0 {
        "Introduction:".to_string()
    } else if position + 1 == total {
        "Conclusion:".to_string()
    } else {
        format!("Chapter {}:", position)
    }
}

/// 组合完整标题: 前缀 + 空格 + 自定义标题
pub fn full_title(position: usize, total: usize, custom_title: &str) -> String {
    let custom = custom_title.trim();
    let custom = if custom.is_empty() {
        DEFAULT_CUSTOM_TITLE
    } else {
        custom
    };
    format!("{} {}", prefix(position, total), custom)
}

/// 从完整标题中提取自定义标题（去掉第一个冒号及之前的内容）
///
/// 没有冒号时整个标题视为自定义标题。
pub fn extract_custom_title(full_title: &str) -> String {
    match full_title.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => full_title.trim().to_string(),
    }
}

/// 去掉位置前缀，返回自定义标题
///
/// 只识别 "Introduction:"、"Conclusion:" 和 "Chapter {n}:"；其他标题原样返回（去掉首尾空白），
/// 因此 "Part: One" 这样的用户标题不会被截断。
pub fn custom_title_of(title: &str) -> String {
    let title = title.trim();
    let rest = ["Introduction:", "Conclusion:"]
        .iter()
        .find_map(|p| title.strip_prefix(p))
        .or_else(|| {
            let after = title.strip_prefix("Chapter ")?;
            let (number, rest) = after.split_once(':')?;
            (!number.is_empty() && number.chars().all(|c| c.is_ascii_digit())).then_some(rest)
        });

    match rest {
        Some(rest) => rest.trim().to_string(),
        None => title.to_string(),
    }
}

/// 按当前顺序重新计算所有条目的完整标题
pub fn retitle(entries: &mut [OutlineEntry]) {
    let total = entries.len();
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.full_title = full_title(position, total, &entry.custom_title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_prefixes() {
        for total in 2..8 {
            assert_eq!(prefix(0, total), "Introduction:");
            assert_eq!(prefix(total - 1, total), "Conclusion:");
            for k in 1..total - 1 {
                assert_eq!(prefix(k, total), format!("Chapter {}:", k));
            }
        }
    }

    #[test]
    fn test_custom_title_only_strips_positional_prefixes() {
        assert_eq!(custom_title_of("Introduction: Arrival"), "Arrival");
        assert_eq!(custom_title_of("Chapter 12: The Storm"), "The Storm");
        assert_eq!(custom_title_of("Conclusion:Home"), "Home");
        assert_eq!(custom_title_of("Part: One"), "Part: One");
        assert_eq!(custom_title_of("Chapter One: Start"), "Chapter One: Start");
        assert_eq!(custom_title_of("  Plain  "), "Plain");
        for total in 1..5 {
            for position in 0..total {
                let full = full_title(position, total, "Part: One");
                assert_eq!(custom_title_of(&full), "Part: One");
            }
        }
    }

    #[test]
    fn test_single_entry_is_introduction() {
        assert_eq!(prefix(0, 1), "Introduction:");
    }

    #[test]
    fn test_inverse_law() {
        let titles = ["The Storm", "  padded  ", "A: colon inside", "Ünïcödé"];
        for total in 1..6 {
            for position in 0..total {
                for custom in titles {
                    let full = full_title(position, total, custom);
                    assert_eq!(extract_custom_title(&full), custom.trim());
                }
            }
        }
    }

    #[test]
    fn test_empty_custom_title_uses_placeholder() {
        assert_eq!(full_title(1, 3, ""), "Chapter 1: New Chapter");
        assert_eq!(full_title(2, 3, "   "), "Conclusion: New Chapter");
    }

    #[test]
    fn test_extract_without_colon() {
        assert_eq!(extract_custom_title("  Plain title "), "Plain title");
    }

    #[test]
    fn test_retitle_is_positional() {
        let mut entries: Vec<OutlineEntry> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| OutlineEntry::new(*t, "", Vec::new()))
            .collect();
        entries.swap(0, 3);
        retitle(&mut entries);

        let titles: Vec<&str> = entries.iter().map(|e| e.full_title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Introduction: d", "Chapter 1: b", "Chapter 2: c", "Conclusion: a"]
        );
    }
}

//! 章节正文工具
//!
//! 正文以富文本（HTML）字符串保存，这里只负责:
//! - 去除标记得到纯文本
//! - 统计字数（派生字段 word_count）
//! - 为新建章节生成模板正文

use super::book::OutlineEntry;

/// 去除 HTML 标签并解码常见实体
pub fn strip_markup(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;

    for ch in content.chars() {
        match ch {
            '<' => {
                in_tag = true;
                // 标签边界视为空白，避免相邻块级元素的单词粘连
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// 统计正文字数（按空白分词）
pub fn word_count(content: &str) -> u32 {
    strip_markup(content).split_whitespace().count() as u32
}

/// 生成新建章节的模板正文
///
/// 标题 + 描述段落 + 要点列表，仅在章节首次创建时使用。
pub fn chapter_template(title: &str, entry: Option<&OutlineEntry>) -> String {
    let mut html = format!("<h2>{}</h2>", escape(title));

    if let Some(entry) = entry {
        let description = entry.description.trim();
        if !description.is_empty() {
            html.push_str(&format!("<p>{}</p>", escape(description)));
        }
        if !entry.key_points.is_empty() {
            html.push_str("<ul>");
            for point in &entry.key_points {
                html.push_str(&format!("<li>{}</li>", escape(point)));
            }
            html.push_str("</ul>");
        }
    }

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

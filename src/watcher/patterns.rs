//! # 文件名模式模块
//!
//! ## 设计思路
//!
//! 配置中的截图文件名使用 shell 通配符（`*`、`?`）描述。匹配只针对
//! 文件名本身，大小写敏感，命中任一模式即视为截图。
//!
//! ## 实现思路
//!
//! 通配符逐条翻译为锚定正则后编译进一个 `RegexSet`，
//! 一次扫描即可完成整组模式的短路匹配。

use regex::RegexSet;

/// 编译后的文件名模式组。
pub(crate) struct PatternSet {
    set: RegexSet,
    raw: Vec<String>,
}

impl PatternSet {
    /// 编译模式列表。
    ///
    /// 翻译后的正则结构上总是合法的；万一编译失败则降级为空集并报错，
    /// 此时所有文件都会被忽略而不是误命中。
    pub(crate) fn compile(patterns: &[String]) -> Self {
        let regexes: Vec<String> = patterns.iter().map(|p| glob_to_regex(p)).collect();
        let set = match RegexSet::new(&regexes) {
            Ok(set) => set,
            Err(err) => {
                log::error!("❌ 编译文件名模式失败：{}，所有文件将被忽略", err);
                RegexSet::empty()
            }
        };

        Self {
            set,
            raw: patterns.to_vec(),
        }
    }

    /// 文件名是否命中任一模式。
    pub(crate) fn matches(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }

    /// 原始模式列表（日志展示用）。
    pub(crate) fn describe(&self) -> &[String] {
        &self.raw
    }
}

/// 将 shell 通配符翻译为锚定正则：`*` 对应 `.*`，`?` 对应 `.`，其余字符转义。
fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

/// 文件类型过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// 不过滤
    #[default]
    None,
    /// 只保留目录
    Directory,
    /// 只保留非目录
    File,
    /// 只保留指定扩展名（包含前导点，已转小写）
    Extension(String),
}

impl TypeFilter {
    /// 将单个标记解析为类型过滤条件
    ///
    /// 支持 `dir` / `file` / `.dir` / `.file` 以及任意 `.ext` 形式的扩展名。
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.to_lowercase();
        match token.as_str() {
            "dir" | ".dir" => Some(TypeFilter::Directory),
            "file" | ".file" => Some(TypeFilter::File),
            t if t.starts_with('.') && t.len() > 1 => Some(TypeFilter::Extension(token)),
            _ => None,
        }
    }

    /// 检查条目是否满足过滤条件
    pub fn matches(&self, name: &str, is_dir: bool) -> bool {
        match self {
            TypeFilter::None => true,
            TypeFilter::Directory => is_dir,
            TypeFilter::File => !is_dir,
            TypeFilter::Extension(ext) => name.to_lowercase().ends_with(ext.as_str()),
        }
    }
}

/// 一次搜索的查询条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// 关键词（已转小写）
    pub keywords: String,
    pub type_filter: TypeFilter,
}

impl Query {
    /// 直接构造查询，关键词会被规范化为小写
    pub fn new(keywords: &str, type_filter: TypeFilter) -> Self {
        Self {
            keywords: keywords.trim().to_lowercase(),
            type_filter,
        }
    }

    /// 从用户输入解析查询
    ///
    /// 末尾的 `dir`、`file` 或以 `.` 开头的标记会被当作类型过滤条件，
    /// 其余标记以单个空格重新拼接为关键词。
    pub fn parse(input: &str) -> Self {
        let mut tokens: Vec<&str> = input.split_whitespace().collect();

        let type_filter = match tokens.last().and_then(|last| TypeFilter::from_token(last)) {
            Some(filter) => {
                tokens.pop();
                filter
            }
            None => TypeFilter::None,
        };

        Self::new(&tokens.join(" "), type_filter)
    }

    /// 是否没有关键词（只按过滤条件列出条目）
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// 需要尝试的关键词变体
    ///
    /// 以 `.` 结尾的关键词会额外尝试去掉末尾点号的版本，
    /// 同一路径的多次命中由排序器去重。
    pub fn keyword_variants(&self) -> Vec<&str> {
        let mut variants = vec![self.keywords.as_str()];
        if let Some(stripped) = self.keywords.strip_suffix('.') {
            let stripped = stripped.trim_end();
            if !stripped.is_empty() {
                variants.push(stripped);
            }
        }
        variants
    }
}

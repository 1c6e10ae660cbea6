//! Keyword-based item categorization.

/// Category assigned when no keyword matches.
pub const DEFAULT_CATEGORY: &str = "기타";

/// Ordered category table; the first category whose keyword appears in the
/// item name wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("스낵", &["과자", "초콜릿", "껌", "젤리", "스낵"]),
    ("음료", &["음료", "커피", "차", "주스", "탄산"]),
    ("아이스크림", &["아이스크림", "빙수", "소르베"]),
    ("생활용품", &["휴지", "비누", "치약", "칫솔"]),
    ("식품", &["라면", "밥", "김", "반찬"]),
    ("얼음", &["얼음", "드라이아이스"]),
    ("담배", &["담배", "라이터"]),
];

/// Infer an item's category from its printed name.
pub fn infer_category(item_name: &str) -> &'static str {
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| item_name.contains(keyword)) {
            return category;
        }
    }
    DEFAULT_CATEGORY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matches() {
        assert_eq!(infer_category("새우깡 과자"), "스낵");
        assert_eq!(infer_category("아메리카노 커피"), "음료");
        assert_eq!(infer_category("피치) 프로즌딸기소르베75G"), "아이스크림");
        assert_eq!(infer_category("도브 비누"), "생활용품");
        assert_eq!(infer_category("신라면 멀티팩"), "식품");
        assert_eq!(infer_category("유어스) 돌덩이얼음1KG"), "얼음");
        assert_eq!(infer_category("일회용 라이터"), "담배");
    }

    #[test]
    fn test_first_category_wins() {
        // A name carrying both a snack and a beverage keyword resolves to
        // the earlier category.
        assert_eq!(infer_category("초콜릿 음료"), "스낵");
    }

    #[test]
    fn test_unmatched_name_is_other() {
        // Contains no keyword from any list ("깡" alone is not a keyword).
        assert_eq!(infer_category("농심) 먹태깡청양마요맛(봉지)"), "기타");
        assert_eq!(infer_category("포장봉투"), "기타");
    }
}

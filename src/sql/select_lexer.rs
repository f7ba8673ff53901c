//! Minimal lexer for the select list of a free-form query
//!
//! This is not a SQL parser. It only understands enough structure to find
//! the top-level `SELECT ... FROM` span and split it on top-level commas,
//! skipping commas inside parentheses, quoted literals and comments.
//! Everything else in the text is opaque.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Select,
    From,
    Distinct,
    Word(String),
    /// '...' / "..." / `...` literal, including the quotes
    Quoted,
    /// `-- ...` up to and including the newline, or `/* ... */`
    Comment,
    Comma,
    LeftParen,
    RightParen,
    Semicolon,
    Symbol(char),
}

impl Token {
    /// Tokens whose text must never be rewritten by normalisation
    pub fn is_opaque(&self) -> bool {
        matches!(self, Token::Quoted | Token::Comment)
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    text: &'a str,
    input: Vec<(usize, char)>,
    position: usize,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        let input: Vec<(usize, char)> = text.char_indices().collect();
        let current = input.first().map(|&(_, c)| c);
        Self {
            text,
            input,
            position: 0,
            current_char: current,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).map(|&(_, c)| c);
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|&(_, c)| c)
    }

    /// Byte offset of the current character (text length at the end)
    fn byte_pos(&self) -> usize {
        self.input
            .get(self.position)
            .map(|&(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Unterminated literals run to the end of the text
    fn skip_quoted(&mut self) {
        let Some(quote) = self.current_char else {
            return;
        };
        self.advance();
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == quote {
                // Doubled quote is an escaped quote
                if self.current_char == Some(quote) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();
        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek(1) == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let token = match self.current_char? {
            ',' => {
                self.advance();
                Token::Comma
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            '\'' | '"' | '`' => {
                self.skip_quoted();
                Token::Quoted
            }
            '-' if self.peek(1) == Some('-') => {
                self.skip_line_comment();
                Token::Comment
            }
            '/' if self.peek(1) == Some('*') => {
                self.skip_block_comment();
                Token::Comment
            }
            ch if ch.is_alphanumeric() || ch == '_' => {
                let word = self.read_word();
                if word.eq_ignore_ascii_case("select") {
                    Token::Select
                } else if word.eq_ignore_ascii_case("from") {
                    Token::From
                } else if word.eq_ignore_ascii_case("distinct") {
                    Token::Distinct
                } else {
                    Token::Word(word)
                }
            }
            ch => {
                self.advance();
                Token::Symbol(ch)
            }
        };

        Some(token)
    }

    /// Tokenize the whole text as (start, end, token) with byte offsets
    pub fn tokenize_all_with_positions(&mut self) -> Vec<(usize, usize, Token)> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start_pos = self.byte_pos();
            let Some(token) = self.next_token() else {
                break;
            };
            let end_pos = self.byte_pos();
            tokens.push((start_pos, end_pos, token));
        }
        tokens
    }
}

/// One comma-separated element of the select list, as trimmed byte spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectItem {
    pub start: usize,
    pub end: usize,
    /// Span of the bare column reference, if the item is one
    reference: Option<(usize, usize)>,
}

impl SelectItem {
    pub fn text<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn reference_span(&self) -> Option<(usize, usize)> {
        self.reference
    }

    /// The referenced column name, when the item is a single bare word
    /// (optionally preceded by DISTINCT)
    pub fn reference<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.reference.map(|(s, e)| &text[s..e])
    }
}

/// The located select list of a query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectClause {
    /// Byte span of the SELECT keyword, if the text has one at top level
    pub keyword: Option<(usize, usize)>,
    pub list_start: usize,
    pub list_end: usize,
    /// End of the last token in the list that is not a comment, or
    /// `list_start` when the list holds only comments and whitespace
    pub content_end: usize,
    /// Byte offsets of the top-level commas inside the list
    pub commas: Vec<usize>,
    pub items: Vec<SelectItem>,
}

impl SelectClause {
    /// Locate the select list. Without a top-level SELECT keyword the text
    /// up to a top-level FROM (or the end) is treated as a bare column list.
    pub fn locate(text: &str) -> Self {
        let tokens = Lexer::new(text).tokenize_all_with_positions();

        let mut depth = 0usize;
        let mut keyword = None;
        let mut keyword_idx = None;
        for (idx, (start, end, token)) in tokens.iter().enumerate() {
            match token {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                Token::Select if depth == 0 => {
                    keyword = Some((*start, *end));
                    keyword_idx = Some(idx);
                    break;
                }
                _ => {}
            }
        }

        let list_start = keyword.map(|(_, end)| end).unwrap_or(0);
        let first_list_token = keyword_idx.map(|i| i + 1).unwrap_or(0);

        let mut list_end = text.len();
        let mut commas = Vec::new();
        let mut list_tokens = Vec::new();
        depth = 0;
        for (start, end, token) in &tokens[first_list_token..] {
            match token {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                Token::From | Token::Semicolon if depth == 0 => {
                    list_end = *start;
                    break;
                }
                Token::Comma if depth == 0 => commas.push(*start),
                _ => {}
            }
            list_tokens.push((*start, *end, token.clone()));
        }

        let content_end = list_tokens
            .iter()
            .rev()
            .find(|(_, _, token)| *token != Token::Comment)
            .map(|(_, end, _)| *end)
            .unwrap_or(list_start);

        let items = Self::split_items(text, list_start, list_end, &commas, &list_tokens);

        Self {
            keyword,
            list_start,
            list_end,
            content_end,
            commas,
            items,
        }
    }

    fn split_items(
        text: &str,
        list_start: usize,
        list_end: usize,
        commas: &[usize],
        tokens: &[(usize, usize, Token)],
    ) -> Vec<SelectItem> {
        let mut bounds = Vec::with_capacity(commas.len() + 2);
        bounds.push(list_start);
        for &comma in commas {
            bounds.push(comma);
            bounds.push(comma + 1);
        }
        bounds.push(list_end);

        bounds
            .chunks(2)
            .map(|pair| {
                let (raw_start, raw_end) = (pair[0], pair[1]);
                let raw = &text[raw_start..raw_end];
                let leading = raw.len() - raw.trim_start().len();
                let trailing = raw.len() - raw.trim_end().len();
                let start = raw_start + leading;
                let end = (raw_end - trailing).max(start);

                let mut item_tokens: Vec<&(usize, usize, Token)> = tokens
                    .iter()
                    .filter(|(s, e, _)| *s >= start && *e <= end)
                    .collect();
                // A trailing comment does not stop the item being a reference
                while matches!(item_tokens.last(), Some((_, _, Token::Comment))) {
                    item_tokens.pop();
                }
                let reference = match item_tokens.as_slice() {
                    [(s, e, Token::Word(_))] => Some((*s, *e)),
                    [(_, _, Token::Distinct), (s, e, Token::Word(_))] => Some((*s, *e)),
                    _ => None,
                };

                SelectItem {
                    start,
                    end,
                    reference,
                }
            })
            .collect()
    }

    pub fn has_select(&self) -> bool {
        self.keyword.is_some()
    }

    /// Position of the item referencing `column`, if any
    pub fn find_reference(&self, text: &str, column: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.reference(text) == Some(column))
    }
}

/// The trimmed, non-empty items of the select list
pub fn select_items(text: &str) -> Vec<String> {
    let clause = SelectClause::locate(text);
    clause
        .items
        .iter()
        .filter(|item| !item.is_empty())
        .map(|item| item.text(text).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_simple_select() {
        let text = "SELECT a, b FROM CUR";
        let clause = SelectClause::locate(text);
        assert_eq!(clause.keyword, Some((0, 6)));
        assert_eq!(&text[clause.list_start..clause.list_end], " a, b ");
        assert_eq!(clause.commas.len(), 1);
        assert_eq!(select_items(text), vec!["a", "b"]);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(select_items("select a , b from cur"), vec!["a", "b"]);
        assert_eq!(select_items("SeLeCt x FrOm y"), vec!["x"]);
    }

    #[test]
    fn test_commas_inside_parens_and_literals_are_ignored() {
        let text = "SELECT COALESCE(a, b), 'x,y' AS lit, c FROM CUR WHERE d IN (1, 2)";
        assert_eq!(
            select_items(text),
            vec!["COALESCE(a, b)", "'x,y' AS lit", "c"]
        );
    }

    #[test]
    fn test_from_inside_subquery_does_not_end_list() {
        let text = "SELECT (SELECT max(x) FROM t) AS m, b FROM CUR";
        assert_eq!(select_items(text), vec!["(SELECT max(x) FROM t) AS m", "b"]);
    }

    #[test]
    fn test_without_select_whole_text_is_list() {
        let clause = SelectClause::locate("a, b");
        assert!(!clause.has_select());
        assert_eq!(select_items("a, b"), vec!["a", "b"]);
        assert_eq!(select_items("single_column"), vec!["single_column"]);
    }

    #[test]
    fn test_references() {
        let text = "SELECT DISTINCT a, b AS bee, sum(c), d FROM CUR";
        let clause = SelectClause::locate(text);
        let refs: Vec<Option<&str>> = clause.items.iter().map(|i| i.reference(text)).collect();
        assert_eq!(refs, vec![Some("a"), None, None, Some("d")]);
        assert_eq!(clause.find_reference(text, "d"), Some(3));
        assert_eq!(clause.find_reference(text, "b"), None);
    }

    #[test]
    fn test_comment_contents_are_opaque() {
        let text = "SELECT a, -- b, c\n d FROM CUR";
        let clause = SelectClause::locate(text);
        assert_eq!(clause.commas.len(), 1);
        assert_eq!(clause.items[1].reference(text), None);
    }

    #[test]
    fn test_trailing_comments_after_list_content() {
        let text = "SELECT a, b /* note */ -- more
FROM CUR";
        let clause = SelectClause::locate(text);
        assert_eq!(&text[..clause.content_end], "SELECT a, b");
        assert_eq!(clause.items[1].reference(text), Some("b"));

        let only_comment = SelectClause::locate("SELECT -- nothing yet
FROM CUR");
        assert_eq!(only_comment.content_end, only_comment.list_start);
    }

    #[test]
    fn test_empty_and_degenerate_text() {
        assert!(select_items("").is_empty());
        assert!(select_items("SELECT").is_empty());
        assert!(select_items("SELECT FROM CUR").is_empty());
        assert_eq!(select_items("SELECT a,,b"), vec!["a", "b"]);
    }

    #[test]
    fn test_unicode_offsets() {
        let text = "SELECT 'é,ü', naïve FROM t";
        let clause = SelectClause::locate(text);
        assert_eq!(clause.items.len(), 2);
        assert_eq!(clause.items[1].reference(text), Some("naïve"));
    }
}

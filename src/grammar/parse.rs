/// A rule as it is written in the grammar text, before its tokens are
/// classified into terminals and variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRule<'a> {
    pub head: &'a str,
    pub alternatives: Vec<Vec<&'a str>>,
}

peg::parser! {

    pub grammar grammar_parser() for str {

        rule token() -> &'input str =
            $((!"->" [^ ' ' | '\t' | '\r' | '\n' | '|' | ';'])+)

        // May be empty, which stands for the empty body.
        rule alternative() -> Vec<&'input str> =
            _ tokens:(token() ** _) _ {
                tokens
            }

        rule arrow_rule() -> RawRule<'input> =
            _ head:token() _ "->" alternatives:(alternative() ++ "|") {
                RawRule { head, alternatives }
            }

        rule compact_rule() -> RawRule<'input> =
            _ head:token() body:(_ t:token() {t})* _ {
                RawRule { head, alternatives: vec![body] }
            }

        rule separator() = quiet!{_ ['\n' | '\r' | ';']}

        pub rule arrow_grammar() -> Vec<RawRule<'input>> =
            separator()* rules:(arrow_rule() ** (separator()+)) separator()* _ ![_] {
                rules
            }

        pub rule compact_grammar() -> Vec<RawRule<'input>> =
            separator()* rules:(compact_rule() ** (separator()+)) separator()* _ ![_] {
                rules
            }

        rule _() = quiet!{[' ' | '\t']*}

    }
}

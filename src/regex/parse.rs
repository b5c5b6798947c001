use crate::grammar::EPSILON_TOKENS;
use crate::regex::Regex;

fn leaf(token: &str) -> Regex {
    if EPSILON_TOKENS.contains(&token) {
        Regex::Epsilon
    } else if token == "∅" {
        Regex::Empty
    } else {
        Regex::Symbol(token.to_string())
    }
}

peg::parser! {

    pub grammar regex_parser() for str {

        rule symbol() -> &'input str =
            $([c if !c.is_whitespace() && !"()|+*.?$".contains(c)]+)

        rule atom() -> Regex =
            "(" _ r:union() _ ")" { r }
            / "$" { Regex::Epsilon }
            / s:symbol() { leaf(s) }

        rule postfix() -> Regex =
            a:atom() ops:(_ op:['*' | '?'] { op })* {
                ops.into_iter().fold(a, |inner, op| match op {
                    '*' => Regex::star(inner),
                    _ => Regex::optional(inner),
                })
            }

        rule concat() -> Regex =
            first:postfix() rest:(_ "."? _ p:postfix() { p })* {
                Regex::concat_all(std::iter::once(first).chain(rest))
            }

        rule union() -> Regex =
            first:concat() rest:(_ ['|' | '+'] _ c:concat() { c })* {
                Regex::union_all(std::iter::once(first).chain(rest))
            }

        pub rule regex() -> Regex =
            _ r:union()? _ ![_] {
                r.unwrap_or(Regex::Empty)
            }

        rule _() = quiet!{[c if c.is_whitespace()]*}

    }
}

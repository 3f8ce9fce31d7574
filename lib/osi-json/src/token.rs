//! # Iterative Parsing Tables
//!
//! The iterative reader drives the JSON grammar with an explicit state
//! machine instead of native recursion. This module holds the pieces of
//! that machine which do not depend on streams or handlers: the token
//! classes recognized from a single character of lookahead, the parser
//! states, and the transition table predicting the next state.
//!
//! Containers are not tracked here. The reader keeps a stack of open
//! containers and resolves the `*Finish` states by popping from it.

use crate::error::ParseErrorCode;

/// ## Token Classes
///
/// Classes of tokens as distinguished by their first character. Scalars
/// are recognized by their first character only and are parsed in full by
/// the reader once the transition is accepted.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Token {
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftCurlyBracket,
    /// `}`
    RightCurlyBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `"`
    String,
    /// `f`
    False,
    /// `t`
    True,
    /// `n`
    Null,
    /// Anything else. Invalid input is rejected by the number parser.
    Number,
}

/// ## Parser States
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum State {
    /// Nothing parsed yet.
    #[default]
    Start,
    /// The root value is complete.
    Finish,
    /// Parsing failed.
    Error,
    /// After `{`.
    ObjectInitial,
    /// After a member name.
    MemberKey,
    /// After the `:` of a member.
    KeyValueDelimiter,
    /// After a member value.
    MemberValue,
    /// After the `,` following a member.
    MemberDelimiter,
    /// At `}`.
    ObjectFinish,
    /// After `[`.
    ArrayInitial,
    /// After an element.
    Element,
    /// After the `,` following an element.
    ElementDelimiter,
    /// At `]`.
    ArrayFinish,
}

impl Token {
    /// ## Classify Character
    ///
    /// Yield the class of the token starting with `c`.
    pub fn classify(c: u8) -> Self {
        match c {
            b'[' => Token::LeftBracket,
            b']' => Token::RightBracket,
            b'{' => Token::LeftCurlyBracket,
            b'}' => Token::RightCurlyBracket,
            b',' => Token::Comma,
            b':' => Token::Colon,
            b'"' => Token::String,
            b'f' => Token::False,
            b't' => Token::True,
            b'n' => Token::Null,
            _ => Token::Number,
        }
    }

    /// Check whether the token starts a scalar value.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Token::String | Token::False | Token::True | Token::Null | Token::Number,
        )
    }
}

impl State {
    // State reached once a value was parsed in this state.
    fn value_target(self) -> Self {
        match self {
            State::Start => State::Finish,
            State::KeyValueDelimiter => State::MemberValue,
            State::ArrayInitial | State::ElementDelimiter => State::Element,
            _ => State::Error,
        }
    }

    /// Check whether a value may start in this state.
    pub fn accepts_value(self) -> bool {
        self.value_target() != State::Error
    }
}

/// ## Predict Next State
///
/// Yield the state reached from `state` when `token` is consumed, or
/// `State::Error` if the token is not allowed there. Opening brackets
/// always enter the initial state of the new container, scalars complete
/// a value right away.
pub fn predict(state: State, token: Token) -> State {
    match (state, token) {
        (s, Token::LeftBracket) if s.accepts_value() => State::ArrayInitial,
        (s, Token::LeftCurlyBracket) if s.accepts_value() => State::ObjectInitial,
        (s, t) if t.is_scalar() && s.accepts_value() => s.value_target(),

        (State::ObjectInitial, Token::String) => State::MemberKey,
        (State::ObjectInitial, Token::RightCurlyBracket) => State::ObjectFinish,
        (State::MemberKey, Token::Colon) => State::KeyValueDelimiter,
        (State::MemberValue, Token::Comma) => State::MemberDelimiter,
        (State::MemberValue, Token::RightCurlyBracket) => State::ObjectFinish,
        (State::MemberDelimiter, Token::String) => State::MemberKey,

        (State::ArrayInitial, Token::RightBracket) => State::ArrayFinish,
        (State::Element, Token::Comma) => State::ElementDelimiter,
        (State::Element, Token::RightBracket) => State::ArrayFinish,

        _ => State::Error,
    }
}

/// ## Rejection Error
///
/// Yield the error reported when `token` is rejected in `state`. `None`
/// stands for the end of the input.
pub fn error(state: State, token: Option<Token>) -> ParseErrorCode {
    match state {
        State::Start => match token {
            None => ParseErrorCode::DocumentEmpty,
            Some(_) => ParseErrorCode::ValueInvalid,
        },
        State::Finish => ParseErrorCode::DocumentRootNotSingular,
        State::ObjectInitial | State::MemberDelimiter => ParseErrorCode::ObjectMissName,
        State::MemberKey => ParseErrorCode::ObjectMissColon,
        State::MemberValue => ParseErrorCode::ObjectMissCommaOrCurlyBracket,
        State::Element => ParseErrorCode::ArrayMissCommaOrSquareBracket,
        State::KeyValueDelimiter
        | State::ArrayInitial
        | State::ElementDelimiter => ParseErrorCode::ValueInvalid,
        _ => ParseErrorCode::UnspecificSyntaxError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn walk(input: &str) -> State {
        input.bytes().fold(State::Start, |s, c| {
            match predict(s, Token::classify(c)) {
                // Containers are resolved by the reader. Pretend they
                // always close at the root.
                State::ObjectFinish | State::ArrayFinish => State::Finish,
                v => v,
            }
        })
    }

    // Transition Test
    //
    // Verify token sequences are walked through the expected states, with
    // each character standing for a single token.
    #[test_case("n", State::Finish ; "scalar root")]
    #[test_case("{", State::ObjectInitial ; "object open")]
    #[test_case("{\":", State::KeyValueDelimiter ; "member key")]
    #[test_case("{\":1", State::MemberValue ; "member value")]
    #[test_case("{\":1,", State::MemberDelimiter ; "member delimiter")]
    #[test_case("{\":[", State::ArrayInitial ; "nested array")]
    #[test_case("[1,t", State::Element ; "elements")]
    #[test_case("[]", State::Finish ; "empty array")]
    #[test_case("{}", State::Finish ; "empty object")]
    fn token_predict(input: &str, expect: State) {
        assert_eq!(walk(input), expect);
    }

    // Rejection Test
    //
    // Verify invalid tokens lead to the error state and map to the error
    // codes of their state.
    #[test]
    fn token_reject() {
        assert_eq!(predict(State::Start, Token::Comma), State::Error);
        assert_eq!(predict(State::ObjectInitial, Token::Number), State::Error);
        assert_eq!(predict(State::MemberDelimiter, Token::RightCurlyBracket), State::Error);
        assert_eq!(predict(State::ElementDelimiter, Token::RightBracket), State::Error);
        assert_eq!(predict(State::Finish, Token::Null), State::Error);

        assert_eq!(error(State::Start, None), ParseErrorCode::DocumentEmpty);
        assert_eq!(error(State::Start, Some(Token::Colon)), ParseErrorCode::ValueInvalid);
        assert_eq!(error(State::MemberKey, Some(Token::Comma)), ParseErrorCode::ObjectMissColon);
        assert_eq!(error(State::Element, None), ParseErrorCode::ArrayMissCommaOrSquareBracket);
        assert_eq!(error(State::ObjectFinish, None), ParseErrorCode::UnspecificSyntaxError);
    }
}

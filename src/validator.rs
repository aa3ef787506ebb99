//! Answer validation for the two input modes.
//!
//! The keyboard path accumulates digits and grades automatically once the
//! input is as long as the expected answer (or longer: an extra digit is
//! always a mistake worth grading). A wrong full-length guess clears the
//! input so the next digit starts fresh. While input is partial, an
//! inactivity deadline is armed; the event loop calls
//! [`AnswerValidator::poll_timeout`] and gets a one-shot encouragement event
//! when it has passed.
//!
//! The voice path is single-shot: the French parser has already produced a
//! number, which is compared directly.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::InputConfig;
use crate::core::digit_count;

/// Keyboard behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Grade automatically at the expected digit count.
    pub auto_validate: bool,
    /// Allow [`AnswerValidator::remove_digit`].
    pub allow_correction: bool,
    /// Inactivity before a partial answer triggers `on_timeout`.
    pub keyboard_timeout: Duration,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self::from(&InputConfig::default())
    }
}

impl From<&InputConfig> for ValidatorOptions {
    fn from(config: &InputConfig) -> Self {
        Self {
            auto_validate: config.auto_validate,
            allow_correction: config.allow_correction,
            keyboard_timeout: Duration::from_millis(config.keyboard_timeout_ms),
        }
    }
}

/// State of the keyboard input after a key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    /// Digits typed so far (before any clear caused by a wrong answer).
    pub value: String,
    /// Whether the input was graded.
    pub complete: bool,
    /// Grade, when complete.
    pub correct: Option<bool>,
}

/// Payload of the correct/incorrect callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub answer: u32,
    pub expected: u32,
}

/// Payload of the timeout callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutEvent {
    pub partial_input: String,
}

type Slot<T> = Option<Box<dyn FnMut(&T)>>;

/// Per-exercise input accumulator.
///
/// Callbacks are single slots: setting one replaces the previous listener.
pub struct AnswerValidator {
    options: ValidatorOptions,
    expected: Option<u32>,
    current_input: String,
    deadline: Option<Instant>,
    on_correct: Slot<AnswerEvent>,
    on_incorrect: Slot<AnswerEvent>,
    on_change: Slot<str>,
    on_timeout: Slot<TimeoutEvent>,
}

impl std::fmt::Debug for AnswerValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerValidator")
            .field("options", &self.options)
            .field("expected", &self.expected)
            .field("current_input", &self.current_input)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new(ValidatorOptions::default())
    }
}

impl AnswerValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            expected: None,
            current_input: String::new(),
            deadline: None,
            on_correct: None,
            on_incorrect: None,
            on_change: None,
            on_timeout: None,
        }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    // =========================================================================
    // Callback slots
    // =========================================================================

    pub fn set_on_correct(&mut self, f: impl FnMut(&AnswerEvent) + 'static) {
        self.on_correct = Some(Box::new(f));
    }

    pub fn set_on_incorrect(&mut self, f: impl FnMut(&AnswerEvent) + 'static) {
        self.on_incorrect = Some(Box::new(f));
    }

    pub fn set_on_change(&mut self, f: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(f));
    }

    pub fn set_on_timeout(&mut self, f: impl FnMut(&TimeoutEvent) + 'static) {
        self.on_timeout = Some(Box::new(f));
    }

    /// Drop every listener and disarm the deadline.
    pub fn clear_callbacks(&mut self) {
        self.deadline = None;
        self.on_correct = None;
        self.on_incorrect = None;
        self.on_change = None;
        self.on_timeout = None;
    }

    // =========================================================================
    // Expected answer
    // =========================================================================

    /// Load the answer for a new exercise and clear any input.
    pub fn set_expected_answer(&mut self, answer: u32) {
        self.expected = Some(answer);
        self.current_input.clear();
        self.deadline = None;
        tracing::debug!(answer, digits = digit_count(answer), "expected answer set");
    }

    pub fn expected_answer(&self) -> Option<u32> {
        self.expected
    }

    /// Digits the expected answer has; 0 before one is set.
    pub fn digit_count(&self) -> usize {
        self.expected.map(digit_count).unwrap_or(0)
    }

    // =========================================================================
    // Keyboard path
    // =========================================================================

    /// Append a digit.
    ///
    /// Returns `None` for anything but `'0'..='9'` or when no answer is set.
    pub fn add_digit(&mut self, digit: char) -> Option<KeyInput> {
        if !digit.is_ascii_digit() {
            return None;
        }
        if self.expected.is_none() {
            tracing::warn!("digit typed before an expected answer was set");
            return None;
        }

        self.deadline = None;
        self.current_input.push(digit);
        self.emit_change();

        if self.options.auto_validate && self.current_input.len() >= self.digit_count() {
            if self.current_input.len() > self.digit_count() {
                tracing::debug!("auto-validating (exceeded digit count)");
            } else {
                tracing::debug!("auto-validating (exact digit count reached)");
            }
            return self.evaluate();
        }

        self.arm_deadline();
        Some(KeyInput {
            value: self.current_input.clone(),
            complete: false,
            correct: None,
        })
    }

    /// Remove the last digit. Returns `false` when nothing was removed.
    pub fn remove_digit(&mut self) -> bool {
        if !self.options.allow_correction || self.current_input.is_empty() {
            return false;
        }

        self.deadline = None;
        self.current_input.pop();
        self.emit_change();

        if !self.current_input.is_empty() {
            self.arm_deadline();
        }
        true
    }

    /// Grade the current input now. Used when auto-validation is off.
    pub fn submit(&mut self) -> Option<KeyInput> {
        if self.current_input.is_empty() || self.expected.is_none() {
            return None;
        }
        self.evaluate()
    }

    fn evaluate(&mut self) -> Option<KeyInput> {
        let expected = self.expected?;
        self.deadline = None;

        let value = self.current_input.clone();
        // Too many digits for u32 is never the right answer
        let answer = value.parse::<u32>().unwrap_or(u32::MAX);
        let correct = answer == expected;
        self.grade(answer, expected, correct);

        Some(KeyInput {
            value,
            complete: true,
            correct: Some(correct),
        })
    }

    // =========================================================================
    // Voice path
    // =========================================================================

    /// Grade a number recognized by speech. Returns whether it is correct.
    pub fn validate_voice(&mut self, number: u32) -> bool {
        let Some(expected) = self.expected else {
            tracing::warn!("voice answer received before an expected answer was set");
            return false;
        };
        let correct = number == expected;
        self.grade(number, expected, correct);
        correct
    }

    fn grade(&mut self, answer: u32, expected: u32, correct: bool) {
        let event = AnswerEvent { answer, expected };
        if correct {
            tracing::debug!(answer, "correct answer");
            if let Some(f) = self.on_correct.as_mut() {
                f(&event);
            }
        } else {
            tracing::debug!(answer, expected, "incorrect answer");
            if let Some(f) = self.on_incorrect.as_mut() {
                f(&event);
            }
            self.current_input.clear();
        }
    }

    // =========================================================================
    // Partial-input timeout
    // =========================================================================

    fn arm_deadline(&mut self) {
        self.deadline = Some(Instant::now() + self.options.keyboard_timeout);
    }

    /// When the pending timeout fires, if one is armed.
    pub fn timeout_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire the timeout if its deadline has passed. Fires at most once per
    /// armed deadline.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<TimeoutEvent> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        let event = TimeoutEvent {
            partial_input: self.current_input.clone(),
        };
        tracing::debug!(partial = %event.partial_input, "keyboard input timeout");
        if let Some(f) = self.on_timeout.as_mut() {
            f(&event);
        }
        Some(event)
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Clear input and deadline, keeping the expected answer.
    pub fn reset(&mut self) {
        self.deadline = None;
        self.current_input.clear();
        self.emit_change();
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    /// Whether enough digits have been typed to grade.
    pub fn is_complete(&self) -> bool {
        self.expected.is_some() && self.current_input.len() >= self.digit_count()
    }

    fn emit_change(&mut self) {
        if let Some(f) = self.on_change.as_mut() {
            f(&self.current_input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn validator(answer: u32) -> AnswerValidator {
        let mut v = AnswerValidator::default();
        v.set_expected_answer(answer);
        v
    }

    #[test]
    fn test_single_digit_exact() {
        let mut v = validator(7);
        let result = v.add_digit('7').unwrap();
        assert_eq!(
            result,
            KeyInput {
                value: "7".into(),
                complete: true,
                correct: Some(true),
            }
        );
    }

    #[test]
    fn test_two_digits_partial_then_complete() {
        let mut v = validator(12);
        let first = v.add_digit('1').unwrap();
        assert!(!first.complete);
        assert_eq!(first.correct, None);
        assert!(!v.is_complete());

        let second = v.add_digit('2').unwrap();
        assert!(second.complete);
        assert_eq!(second.correct, Some(true));
    }

    #[test]
    fn test_wrong_full_length_clears_input() {
        let mut v = validator(12);
        v.add_digit('9');
        let result = v.add_digit('9').unwrap();
        assert!(result.complete);
        assert_eq!(result.correct, Some(false));
        assert_eq!(result.value, "99");
        assert_eq!(v.current_input(), "");
    }

    #[test]
    fn test_manual_mode_does_not_auto_submit_overflow() {
        let mut v = AnswerValidator::new(ValidatorOptions {
            auto_validate: false,
            ..ValidatorOptions::default()
        });
        v.set_expected_answer(5);
        assert!(!v.add_digit('1').unwrap().complete);
        assert!(!v.add_digit('2').unwrap().complete);
        assert!(v.is_complete());
        let result = v.submit().unwrap();
        assert_eq!(result.value, "12");
        assert_eq!(result.correct, Some(false));
    }

    #[test]
    fn test_leading_zero_is_graded_by_value() {
        // "07" never happens with auto-validation on a one-digit answer,
        // but a manual submit compares numerically
        let mut v = AnswerValidator::new(ValidatorOptions {
            auto_validate: false,
            ..ValidatorOptions::default()
        });
        v.set_expected_answer(7);
        v.add_digit('0');
        v.add_digit('7');
        assert_eq!(v.submit().unwrap().correct, Some(true));
    }

    #[test]
    fn test_non_digit_ignored() {
        let mut v = validator(3);
        assert!(v.add_digit('a').is_none());
        assert!(v.add_digit('-').is_none());
        assert_eq!(v.current_input(), "");
    }

    #[test]
    fn test_digit_without_expected_answer() {
        let mut v = AnswerValidator::default();
        assert!(v.add_digit('4').is_none());
        assert!(!v.validate_voice(4));
        assert_eq!(v.digit_count(), 0);
    }

    #[test]
    fn test_set_expected_answer_clears_input() {
        let mut v = validator(42);
        v.add_digit('4');
        v.set_expected_answer(13);
        assert_eq!(v.current_input(), "");
        assert_eq!(v.expected_answer(), Some(13));
        assert_eq!(v.digit_count(), 2);
    }

    #[test]
    fn test_remove_digit() {
        let mut v = validator(42);
        v.add_digit('4');
        assert!(v.remove_digit());
        assert_eq!(v.current_input(), "");
        assert!(v.timeout_deadline().is_none());
        // Nothing left to remove
        assert!(!v.remove_digit());
    }

    #[test]
    fn test_remove_digit_rearms_deadline() {
        let mut v = validator(123);
        v.add_digit('1');
        v.add_digit('2');
        let before = v.timeout_deadline().unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert!(v.remove_digit());
        assert_eq!(v.current_input(), "1");
        let after = v.timeout_deadline().unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_remove_digit_disallowed() {
        let mut v = AnswerValidator::new(ValidatorOptions {
            allow_correction: false,
            ..ValidatorOptions::default()
        });
        v.set_expected_answer(42);
        v.add_digit('4');
        assert!(!v.remove_digit());
        assert_eq!(v.current_input(), "4");
    }

    #[test]
    fn test_voice_path() {
        let mut v = validator(75);
        assert!(v.validate_voice(75));
        assert!(!v.validate_voice(57));
    }

    #[test]
    fn test_reset_keeps_expected() {
        let mut v = validator(42);
        v.add_digit('4');
        v.reset();
        assert_eq!(v.current_input(), "");
        assert_eq!(v.expected_answer(), Some(42));
        assert!(v.timeout_deadline().is_none());
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut v = validator(42);
        v.add_digit('4');
        let now = Instant::now();
        assert!(v.poll_timeout(now).is_none());

        let later = now + Duration::from_secs(11);
        let event = v.poll_timeout(later).unwrap();
        assert_eq!(event.partial_input, "4");
        assert!(v.poll_timeout(later).is_none());
    }

    #[test]
    fn test_timeout_not_armed_after_grading() {
        let mut v = validator(4);
        v.add_digit('4');
        assert!(v.timeout_deadline().is_none());
        assert!(v
            .poll_timeout(Instant::now() + Duration::from_secs(60))
            .is_none());
    }

    #[test]
    fn test_new_digit_rearms_deadline() {
        let mut v = validator(123);
        v.add_digit('1');
        let first = v.timeout_deadline().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        v.add_digit('2');
        let second = v.timeout_deadline().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_callbacks() {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut v = validator(12);

        let l = Rc::clone(&log);
        v.set_on_correct(move |e| l.borrow_mut().push(format!("correct {}", e.answer)));
        let l = Rc::clone(&log);
        v.set_on_incorrect(move |e| {
            l.borrow_mut()
                .push(format!("incorrect {} != {}", e.answer, e.expected))
        });
        let l = Rc::clone(&log);
        v.set_on_change(move |s| l.borrow_mut().push(format!("change '{}'", s)));
        let l = Rc::clone(&log);
        v.set_on_timeout(move |e| l.borrow_mut().push(format!("timeout '{}'", e.partial_input)));

        v.add_digit('1');
        v.poll_timeout(Instant::now() + Duration::from_secs(30));
        v.add_digit('3');
        v.add_digit('1');
        v.add_digit('2');

        assert_eq!(
            *log.borrow(),
            vec![
                "change '1'",
                "timeout '1'",
                "change '13'",
                "incorrect 13 != 12",
                "change '1'",
                "change '12'",
                "correct 12",
            ]
        );
    }

    #[test]
    fn test_callback_slot_is_replaced() {
        let hits = Rc::new(RefCell::new((0, 0)));
        let mut v = validator(3);

        let h = Rc::clone(&hits);
        v.set_on_correct(move |_| h.borrow_mut().0 += 1);
        let h = Rc::clone(&hits);
        v.set_on_correct(move |_| h.borrow_mut().1 += 1);

        v.validate_voice(3);
        assert_eq!(*hits.borrow(), (0, 1));

        v.clear_callbacks();
        v.validate_voice(3);
        assert_eq!(*hits.borrow(), (0, 1));
    }

    #[test]
    fn test_options_from_config() {
        let config = InputConfig {
            keyboard_timeout_ms: 2500,
            auto_validate: false,
            allow_correction: true,
        };
        let options = ValidatorOptions::from(&config);
        assert_eq!(options.keyboard_timeout, Duration::from_millis(2500));
        assert!(!options.auto_validate);
    }
}

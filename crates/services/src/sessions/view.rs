use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuestionView};

/// Build the client view of `question`, with option texts in fresh random order.
///
/// `position` is the 0-based cursor; the view reports it 1-based.
pub(crate) fn question_view<R: Rng + ?Sized>(
    question: &Question,
    position: usize,
    total: usize,
    rng: &mut R,
) -> QuestionView {
    let mut options = question.option_texts();
    options.shuffle(rng);

    QuestionView {
        question: question.text().to_string(),
        options,
        index: position + 1,
        total,
    }
}

use super::super::ClassifierPage;
use yew::prelude::*;

/// Banner for a failed upload; the page stays usable.
pub fn render_error_message(model: &ClassifierPage) -> Html {
    if let Some(error_msg) = &model.error {
        html! {
            <div class="error-message">
                <p>{ error_msg }</p>
            </div>
        }
    } else {
        html! {}
    }
}

/// Replaces the page body when the model could not be made available.
pub fn render_fatal_error(message: &str) -> Html {
    html! {
        <div class="error-message fatal">
            <p>{"El clasificador no está disponible."}</p>
            <p class="error-detail">{ message }</p>
        </div>
    }
}

//! Fixed user-facing texts.

pub const EXAMPLES: &str = "You can ask me everything you have in mind, but if you need some help: \
https://www.wolframalpha.com/examples/";

pub const HELP: &str = "If you are here, you probably don't understand what this bot is about.\n\
You don't have to write commands to make it work, just write plain in the chat a query like \
256*log(25) and receive the result, or send a voice message in english with your query!\n\
Send me a photo and I'll read the text inside it.\n\n\
/yes — show the images of the last result\n\
/no — forget the last result\n\
/ping — check that I'm alive";

pub const PONG: &str = "pong";

pub const ASK_IMAGES: &str = "Would you like to see it in images? Reply /yes or /no.";

pub const DISCARDED: &str = "Okay, forgotten. Send me another query!";

pub const NO_PREVIOUS: &str = "No previous message, try to say something!";

pub const NO_RESULT: &str = "No result found! Try writing something else, like an equation! \
You must write it in english, without any emoji!";

pub const AUDIO_UNRECOGNIZED: &str = "This audio is too short or corrupted, retry!";

pub const VOICE_DISABLED: &str =
    "Voice messages are not enabled on this bot, send me your query as text!";

pub const NO_TEXT_IN_IMAGE: &str = "I couldn't find any text in this image.";

pub const UNSUPPORTED: &str =
    "Sorry, I can't handle this kind of message. Send me text, a voice message or a photo!";

pub const GENERIC_FAILURE: &str = "Something went wrong while handling your message, please retry.";

pub fn welcome(first_name: &str) -> String {
    format!(
        "Welcome to querybot, {first_name}! Send me a query or a voice message, \
         like 1GHz to Hz or log(25)!\nYou can also send me an image and receive the text inside it!"
    )
}

/// Prefix for text read from a photo.
pub fn extracted(text: &str) -> String {
    format!("Result: {text}")
}

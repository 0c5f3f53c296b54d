use emu8::FrameBuffer;

const ON: char = '█';
const OFF: char = ' ';

/// Formats a Chip-8 FrameBuffer for a terminal.
///
/// Each row of the frame becomes one line with one character per pixel.
///
/// # Arguments
/// * `frame` a Chip-8 FrameBuffer
pub fn frame_to_text(frame: &FrameBuffer) -> String {
    frame
        .iter()
        .map(|row| {
            row.iter()
                .map(|&pixel| if pixel == 1 { ON } else { OFF })
                .collect::<String>()
        })
        .collect::<Vec<String>>()
        .join("\n")
}

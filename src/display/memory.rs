//! In-memory display
//!
//! Clones share state, so a test can keep one handle to feed input and
//! inspect frames while the shell owns another.

use super::{Display, RawInput};
use crate::gfx::{Size, Surface};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct State {
    size: Size,
    script: VecDeque<RawInput>,
    last_frame: Option<Surface>,
    frames: u64,
    interactive: bool,
    shut_down: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    state: Rc<RefCell<State>>,
}

impl HeadlessDisplay {
    pub fn new(size: Size) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                size,
                ..State::default()
            })),
        }
    }

    /// Pretend a user is present (recovery prompts are answered from the script)
    pub fn interactive(self) -> Self {
        self.state.borrow_mut().interactive = true;
        self
    }

    /// Queue input for the next polls
    pub fn push(&self, input: RawInput) {
        self.state.borrow_mut().script.push_back(input);
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().script.len()
    }

    /// Change size and queue the matching resize notification
    pub fn resize(&self, size: Size) {
        let mut state = self.state.borrow_mut();
        state.size = size;
        state.script.push_back(RawInput::Resize(size));
    }

    pub fn last_frame(&self) -> Option<Surface> {
        self.state.borrow().last_frame.clone()
    }

    pub fn frames_presented(&self) -> u64 {
        self.state.borrow().frames
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.borrow().shut_down
    }
}

impl Display for HeadlessDisplay {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn poll(&mut self) -> Result<Option<RawInput>> {
        Ok(self.state.borrow_mut().script.pop_front())
    }

    fn present(&mut self, frame: &Surface) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.frames += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        self.state.borrow().interactive
    }

    fn shutdown(&mut self) -> Result<()> {
        self.state.borrow_mut().shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Color, Point};

    #[test]
    fn test_clones_share_script_and_frames() {
        let handle = HeadlessDisplay::new(Size::new(10, 10));
        let mut display = handle.clone();

        handle.push(RawInput::PointerDown(Point::new(1, 2)));
        assert_eq!(display.poll().unwrap(), Some(RawInput::PointerDown(Point::new(1, 2))));
        assert_eq!(display.poll().unwrap(), None);

        display
            .present(&Surface::filled(Size::new(10, 10), Color::RED))
            .unwrap();
        assert_eq!(handle.frames_presented(), 1);
        assert_eq!(handle.last_frame().unwrap().get(0, 0), Some(Color::RED));
        assert!(!display.is_interactive());
    }

    #[test]
    fn test_resize_queues_notification() {
        let handle = HeadlessDisplay::new(Size::new(10, 10));
        let mut display = handle.clone();
        handle.resize(Size::new(20, 30));
        assert_eq!(display.size(), Size::new(20, 30));
        assert_eq!(display.poll().unwrap(), Some(RawInput::Resize(Size::new(20, 30))));
    }
}

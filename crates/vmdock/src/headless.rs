use vmdock_core::{Rect, Surface, ViewModel, WindowHandle};

/// Terminal stand-in for the dock window: reports what a graphical window
/// would show.
pub struct HeadlessWindow {
    handle: WindowHandle,
    cards: Vec<String>,
}

impl HeadlessWindow {
    pub fn new(handle: WindowHandle) -> Self {
        Self {
            handle,
            cards: Vec::new(),
        }
    }
}

impl Surface for HeadlessWindow {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn rebuild(&mut self, model: &ViewModel) {
        self.cards = model
            .vms
            .iter()
            .map(|vm| {
                let state = if vm.power_state.is_on() { "on " } else { "off" };
                format!("[{state}] {:<24} {:<20} {}", vm.name, vm.label, vm.key)
            })
            .collect();

        println!("── {} vm(s) ──", self.cards.len());
        for card in &self.cards {
            println!("{card}");
        }
        for host in &model.hosts {
            println!(
                "{:<20} cpu {:>6.2}% ({:?})  mem {:>6.2}% ({:?})  disk free {:>6.2}% ({:?})  vms {}/{}",
                host.label,
                host.cpu.percent,
                host.cpu.level,
                host.memory.percent,
                host.memory.level,
                host.disk_free.percent,
                host.disk_free.level,
                host.vms_on,
                host.vms_on + host.vms_off,
            );
        }
    }

    fn set_geometry(&mut self, window: Rect) {
        tracing::info!(
            x = window.x,
            y = window.y,
            width = window.width,
            height = window.height,
            "window: geometry set"
        );
    }

    fn place_cards(&mut self, cards: &[Rect]) {
        for (label, rect) in self.cards.iter().zip(cards) {
            tracing::debug!(card = %label, x = rect.x, y = rect.y, "window: card placed");
        }
    }

    fn notify(&mut self, notice: &str) {
        println!("! {notice}");
    }
}

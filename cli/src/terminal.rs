use nudge_core::ModalPresenter;
use nudge_core::presentation::CloseReason;
use nudge_core::presentation::ModalContent;
use owo_colors::OwoColorize;

/// Renders the modal as a block of text on stdout.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl ModalPresenter for TerminalPresenter {
    fn present(&self, content: &ModalContent) {
        let domain = content.domain().as_str().to_uppercase();
        println!();
        println!("{} {}", format!("[{domain}]").bold().red(), content.summary.title.bold());
        println!("  {}", content.summary.body);
        println!(
            "  {}",
            "enter: dismiss   v: view   r: refresh   b: badge   q: quit".dimmed()
        );
    }

    fn dismiss(&self, content: &ModalContent, reason: CloseReason) {
        match reason {
            CloseReason::Dismissed => println!("{}", format!("dismissed {}", content.id()).dimmed()),
            CloseReason::Viewed => println!("open {}", content.target.path.cyan()),
        }
    }
}

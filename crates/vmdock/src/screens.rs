use vmdock_core::{Rect, Screen, StaticScreens};

pub const SCREENS_ENV: &str = "VMDOCK_SCREENS";
const DEFAULT_SCREEN: (i32, i32) = (1920, 1080);

/// Monitors from a `WxH[,WxH...]` list, laid out left to right. Falls back to
/// a single 1920x1080 screen when the list is missing or malformed.
pub fn from_env() -> StaticScreens {
    match std::env::var(SCREENS_ENV) {
        Ok(list) => parse(&list).unwrap_or_else(|| {
            tracing::warn!(screens = %list, "screens: could not parse {SCREENS_ENV}, using default");
            default_screens()
        }),
        Err(_) => default_screens(),
    }
}

fn default_screens() -> StaticScreens {
    StaticScreens(vec![screen(0, DEFAULT_SCREEN.0, DEFAULT_SCREEN.1)])
}

fn screen(x: i32, width: i32, height: i32) -> Screen {
    let rect = Rect::new(x, 0, width, height);
    Screen {
        geometry: rect,
        available: rect,
    }
}

pub fn parse(list: &str) -> Option<StaticScreens> {
    let mut screens = Vec::new();
    let mut x = 0;
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (w, h) = part.split_once(['x', 'X'])?;
        let width: i32 = w.trim().parse().ok().filter(|v| *v > 0)?;
        let height: i32 = h.trim().parse().ok().filter(|v| *v > 0)?;
        screens.push(screen(x, width, height));
        x += width;
    }
    (!screens.is_empty()).then_some(StaticScreens(screens))
}

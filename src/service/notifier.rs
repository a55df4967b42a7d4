//! "请在设备上确认" 提示
//!
//! UI 层可以注入自己的实现（弹窗等），默认只写日志。

pub const CONFIRM_ON_DEVICE: &str = "Please confirm in your ledger";

pub trait DeviceNotifier: Send + Sync {
    fn confirm_on_device(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl DeviceNotifier for TracingNotifier {
    fn confirm_on_device(&self, message: &str) {
        tracing::info!(prompt = %message, "Waiting for confirmation on device");
    }
}

/// 回调形式的提示，便于接入前端弹窗
pub struct CallbackNotifier {
    callback: Box<dyn Fn(&str) + Send + Sync>,
}

impl CallbackNotifier {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl DeviceNotifier for CallbackNotifier {
    fn confirm_on_device(&self, message: &str) {
        (self.callback)(message);
    }
}

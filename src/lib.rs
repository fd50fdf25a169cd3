//! # 过敏原扫描客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     视图表面 (ScanView)                   │
//! │        HtmlView（页面片段） / TerminalView（终端）        │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ↕ 触发 / 结果替换
//! ┌───────────────────────────┼──────────────────────────────┐
//! │  page ──── ScanPage（唯一可变状态 SessionState 的持有者） │
//! │   │                                                      │
//! │   ├─ media ──────── 摄像头申请 · 抓帧 JPEG · 上传加载      │
//! │   ├─ barcode ────── Idle/Scanning 状态机 + 识别订阅        │
//! │   └─ scan                                                │
//! │       ├─ dispatcher 提交 + 结果归类（永不抛错）            │
//! │       ├─ client     reqwest multipart / JSON              │
//! │       └─ render     扫描结果 → HTML / 纯文本              │
//! │                                                          │
//! │  config · settings · error · session                     │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ↕ HTTP
//!              POST /scan （multipart image）
//!              POST /scan_barcode （JSON { barcode }）
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`config`] | 服务端地址、超时、上传上限、抓帧参数、页面形态 |
//! | [`settings`] | JSON 设置文件加载（camelCase） |
//! | [`session`] | 扫描会话状态记录 |
//! | [`media`] | 摄像头来源、抓帧编码、上传图片加载 |
//! | [`scan`] | 扫描请求分发、HTTP 后端、结果渲染 |
//! | [`barcode`] | 条码识别引擎抽象与识别循环 |
//! | [`page`] | 页面控制器与视图表面 |

pub mod barcode;
pub mod config;
pub mod error;
pub mod media;
pub mod page;
pub mod scan;
pub mod session;
pub mod settings;

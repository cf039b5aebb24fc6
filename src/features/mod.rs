/// 存活与健康检查
pub mod health;
/// 人脸替换（外部工具代理）
pub mod swap;

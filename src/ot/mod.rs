//! # 不经意传输模块 (Oblivious Transfer)
//!
//! 本模块实现 1-out-of-2 不经意传输：发送方持有两个消息 m₀ 和 m₁，
//! 接收方持有选择位 c ∈ {0, 1}；协议结束后接收方只获得 m_c，
//! 发送方不知道 c，接收方也无法得到 m₁₋c。
//!
//! ## 构造 (Bellare-Micali)
//!
//! 在固定的素数阶群（见 [`crate::crypto::OtGroup`]）上，公共基点 C 的
//! 离散对数对双方都未知：
//!
//! 1. 接收方采样 x，计算 h_c = g^x 与 h₁₋c = C · (g^x)⁻¹，发送 (h₀, h₁)。
//!    不变式 h₀ · h₁ = C 保证接收方至多知道其中一个的离散对数。
//! 2. 发送方校验 h₀ · h₁ = C 与子群成员性；对每个 i 采样 yᵢ，
//!    回复 (g^{yᵢ}, Enc(KDF(hᵢ^{yᵢ}), mᵢ))。
//! 3. 接收方由 (g^{y_c})^x 派生密钥并解密 m_c；另一个槽位的密钥
//!    等价于解一个 Diffie-Hellman 实例，不可得。
//!
//! ## 在姚氏协议中的用法
//!
//! 求值方对自己的每条输入线运行一次 OT：发送方消息是该线的两个
//! (线密钥 ‖ 加密比特) 对，选择位是求值方的明文输入比特。批量传输时
//! 每个实例使用独立随机数，顺序与电路声明的求值方输入线一致。
//!
//! ## 安全性质
//!
//! - **接收方隐私**: (h₀, h₁) 的分布与选择位无关
//! - **发送方隐私**: 接收方只能解密所选槽位（CDH 假设下）
//! - 协议只在半诚实模型下分析；所有接收到的群元素都经过成员检查

pub mod bellare_micali;

pub use bellare_micali::*;
